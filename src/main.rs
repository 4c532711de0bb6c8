use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
};
use tracing::{info, warn};

use testdesk::{
    app::{App, Flow},
    app_dirs::AppDirs,
    bank::{self, EmbeddedBank, QuestionBank, TestDescriptor, TestType},
    config::{Config, ConfigStore, FileConfigStore},
    input::KeyBindings,
    logging::{init_logging, LogConfig},
    runtime::{CrosstermEventSource, DeskEvent, FixedTicker, Runner},
    session::Session,
    store::{export_results_csv, SessionStore, SqliteStore, StoreSink},
    submission::SubmissionResult,
    ui::screen::current_screen,
    util::format_clock,
};

/// timed assessment sessions in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Take a timed multiple-choice test in the terminal: a countdown that auto-submits, a question palette, mark-for-review, pause/resume and a built-in calculator."
)]
pub struct Cli {
    /// category of test to take
    #[clap(short = 't', long, value_enum)]
    test_type: Option<TestType>,

    /// number of questions
    #[clap(short = 'q', long)]
    questions: Option<usize>,

    /// test duration in minutes
    #[clap(short = 'd', long)]
    duration: Option<u64>,

    /// resume a stored test descriptor by key
    #[clap(long, value_name = "KEY")]
    resume: Option<String>,

    /// list the built-in tests and exit
    #[clap(long)]
    list: bool,

    /// print the N most recent results and exit
    #[clap(long, value_name = "N")]
    history: Option<usize>,

    /// export all stored results as CSV and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// seed for question order
    #[clap(long)]
    seed: Option<u64>,

    /// write logs here instead of the default state directory
    #[clap(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// more log detail (-v debug, -vv trace)
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Catalog entry for the chosen type with CLI and config overrides applied
    fn to_descriptor(&self, config: &Config) -> TestDescriptor {
        let test_type = self.test_type.unwrap_or(config.test_type);
        let mut descriptor = bank::catalog_entry(test_type).unwrap_or_else(|| {
            TestDescriptor::new("custom", format!("{test_type} Test"), test_type, 10, 10)
        });

        if let Some(q) = self.questions.or(config.questions) {
            descriptor.questions = q;
        }
        if let Some(d) = self.duration.or(config.duration_minutes) {
            descriptor.duration_minutes = d;
        }
        if self.questions.is_some() || self.duration.is_some() {
            descriptor.id = format!(
                "{}-{}q-{}m",
                descriptor.id, descriptor.questions, descriptor.duration_minutes
            );
        }
        descriptor
    }

    fn bindings(config: &Config) -> KeyBindings {
        if config.alt_modifier {
            KeyBindings {
                modifier: crossterm::event::KeyModifiers::ALT,
            }
        } else {
            KeyBindings::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = FileConfigStore::new().load();

    let log_path = cli
        .log_file
        .clone()
        .or_else(AppDirs::log_path)
        .unwrap_or_else(|| PathBuf::from("testdesk.log"));
    if let Err(err) = init_logging(&LogConfig::from_verbosity(cli.verbose, &config.log_level, log_path)) {
        eprintln!("logging disabled: {err}");
    }

    if cli.list {
        print_catalog();
        return Ok(());
    }
    if let Some(n) = cli.history {
        print_history(&SqliteStore::new()?.recent_results(n)?);
        return Ok(());
    }
    if let Some(path) = &cli.export {
        let mut results = SqliteStore::new()?.recent_results(usize::MAX >> 1)?;
        results.reverse();
        export_results_csv(&results, File::create(path)?)?;
        println!("exported {} results to {}", results.len(), path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let descriptor = match &cli.resume {
        Some(key) => match SqliteStore::new()?.load_session(key)? {
            Some(d) => d,
            None => {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::InvalidValue, format!("no stored test named '{key}'"))
                    .exit();
            }
        },
        None => cli.to_descriptor(&config),
    };

    let bank = match cli.seed {
        Some(seed) => EmbeddedBank::with_seed(seed),
        None => EmbeddedBank::new(),
    };
    let questions = bank.load(&descriptor)?;

    let mut session = Session::init(descriptor.clone(), questions)?;
    if config.save_results {
        match SqliteStore::new() {
            Ok(store) => {
                if let Err(err) = store.save_session(&descriptor.id, &descriptor) {
                    warn!(%err, "could not store test descriptor");
                }
                session = session.with_sink(Box::new(StoreSink::new(store)));
            }
            Err(err) => warn!(%err, "results will not be saved"),
        }
    }

    let mut app = App::new(session, Cli::bindings(&config));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        // lets Ctrl+M and Ctrl+C arrive as modified keys instead of Enter/interrupt codes
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run = start_tui(&mut terminal, &mut app);

    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    run?;

    match app.session.teardown() {
        Some(result) => print_summary(&result),
        None => println!("test abandoned, nothing was submitted"),
    }
    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::one_hz());

    loop {
        terminal.draw(|f| current_screen(&app.state).render(app, f))?;

        let flow = match runner.step() {
            DeskEvent::Tick => {
                app.on_tick();
                Flow::Continue
            }
            DeskEvent::Resize => Flow::Continue,
            DeskEvent::Key(key) => app.on_key(key),
        };

        match flow {
            Flow::Continue => {}
            Flow::ResetClock => runner.reset_clock(),
            Flow::Quit => {
                info!("quit requested");
                break;
            }
        }
    }

    Ok(())
}

fn print_catalog() {
    for d in bank::catalog() {
        println!(
            "{:<10} {:<30} {:<14} {:>3} questions  {:>3} min",
            d.id,
            d.title,
            d.test_type.to_string(),
            d.questions,
            d.duration_minutes
        );
    }
}

fn print_history(results: &[SubmissionResult]) {
    if results.is_empty() {
        println!("no results yet");
        return;
    }
    for r in results {
        println!(
            "{}  {:<30} {:>3}/{:<3} answered  {:>3} marked  {}  {}",
            r.submitted_at.format("%Y-%m-%d %H:%M"),
            r.title,
            r.answered_count,
            r.question_count(),
            r.marked_count,
            format_clock(r.elapsed_seconds),
            r.trigger
        );
    }
}

fn print_summary(result: &SubmissionResult) {
    let how = if result.timed_out() {
        "time expired, auto-submitted"
    } else {
        "submitted"
    };
    println!(
        "{}: {how}. {} of {} answered, {} marked, time used {}",
        result.title,
        result.answered_count,
        result.question_count(),
        result.marked_count,
        format_clock(result.elapsed_seconds)
    );
}
