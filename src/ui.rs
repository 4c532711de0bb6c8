pub mod results;
pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::{App, AppState},
    palette::PaletteStatus,
    util::format_clock,
};

const HORIZONTAL_MARGIN: u16 = 2;
const PALETTE_COLUMNS: usize = 5;
const LOW_TIME_SECS: u64 = 60;

pub fn status_color(status: PaletteStatus) -> Color {
    match status {
        PaletteStatus::Answered => Color::Green,
        PaletteStatus::Marked => Color::Magenta,
        PaletteStatus::AnsweredMarked => Color::Blue,
        PaletteStatus::Current => Color::Yellow,
        PaletteStatus::NotVisited => Color::DarkGray,
    }
}

/// Rectangle of the given percentage size centered in `area`.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Min(5),    // question + palette
                Constraint::Length(if self.fullscreen { 0 } else { 1 }), // help
            ])
            .split(area);

        render_header(self, chunks[0], buf);

        let body = if self.fullscreen {
            vec![chunks[1]]
        } else {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(chunks[1])
                .to_vec()
        };

        if self.session.is_paused() {
            render_paused(body[0], buf);
        } else {
            render_question(self, body[0], buf);
        }
        if let Some(palette_area) = body.get(1) {
            render_palette(self, *palette_area, buf);
        }

        if !self.fullscreen {
            render_help(self, chunks[2], buf);
        }

        if self.calculator_visible {
            render_calculator(self, area, buf);
        }
        if self.state == AppState::ConfirmSubmit {
            render_confirm(self, area, buf);
        }
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let descriptor = session.descriptor();

    let left = format!(
        "{} · {} · Q {}/{}",
        descriptor.title,
        descriptor.test_type,
        session.current_index() + 1,
        session.question_count()
    );
    let mut right = format!("⏱ {}", format_clock(session.remaining_seconds()));
    if session.is_paused() {
        right.push_str("  PAUSED");
    }

    let clock_style = if session.remaining_seconds() <= LOW_TIME_SECS {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let gap = (area.width as usize).saturating_sub(left.width() + right.width());
    let line = Line::from(vec![
        Span::styled(left, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, clock_style),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn render_question(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let question = session.current_question();
    let state = session.answer(session.current_index()).cloned().unwrap_or_default();

    let mut title = format!(" Question {} ", question.ordinal);
    if state.is_marked {
        title.push_str("· marked for review ");
    }
    if let Some(confidence) = state.confidence {
        title.push_str(&format!("· {confidence} "));
    }

    let mut lines = vec![
        Line::from(Span::styled(
            question.prompt.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    for (idx, option) in question.options.iter().enumerate() {
        let selected = state.selected_option == Some(idx);
        let marker = if selected { "●" } else { "○" };
        let style = if selected {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(" {marker} [{}] {option}", idx + 1),
            style,
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn render_paused(area: Rect, buf: &mut Buffer) {
    Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(
            "PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )),
        Line::from("The clock is stopped. Press Ctrl+P to resume."),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .render(area, buf);
}

fn render_palette(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let statuses = session.statuses();

    let mut lines: Vec<Line> = statuses
        .iter()
        .enumerate()
        .chunks(PALETTE_COLUMNS)
        .into_iter()
        .map(|row| {
            Line::from(
                row.map(|(idx, status)| {
                    let mut style = Style::default().fg(status_color(*status));
                    if idx == session.current_index() {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Span::styled(format!("{:>3} ", idx + 1), style)
                })
                .collect::<Vec<_>>(),
            )
        })
        .collect();

    let counts = session.palette();
    lines.push(Line::default());
    for (status, count) in [
        (PaletteStatus::Answered, counts.answered),
        (PaletteStatus::Marked, counts.marked),
        (PaletteStatus::AnsweredMarked, counts.answered_marked),
        (PaletteStatus::NotVisited, counts.not_visited + counts.current),
    ] {
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(status_color(status))),
            Span::raw(format!("{status}: {count}")),
        ]));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Palette "))
        .render(area, buf);
}

fn render_help(app: &App, area: Rect, buf: &mut Buffer) {
    let text = if app.calculator_visible {
        "calc: 0-9 . + - * / = ⏎  ⌫ del │ ^C close │ ←/→ move"
    } else {
        "←/→ move │ 1-4 answer │ ⌫ clear │ tab confidence │ ⏎/^M mark │ ^P pause │ ^C calc │ ^F full │ ^S submit │ esc quit"
    };
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_calculator(app: &App, area: Rect, buf: &mut Buffer) {
    let popup = Rect {
        x: area.x + area.width.saturating_sub(34),
        y: area.y + 2,
        width: 32.min(area.width),
        height: 5.min(area.height),
    };
    Clear.render(popup, buf);
    let display_style = if app.calculator.is_error() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(app.calculator.display(), display_style)),
    ])
    .alignment(Alignment::Right)
    .block(Block::default().borders(Borders::ALL).title(" Calculator "))
    .render(popup, buf);
}

fn render_confirm(app: &App, area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(50, 30, area);
    Clear.render(popup, buf);
    let counts = app.session.palette();
    let answered = counts.answered + counts.answered_marked;
    Paragraph::new(vec![
        Line::from(format!(
            "{answered} of {} answered, {} marked for review.",
            app.session.question_count(),
            counts.marked + counts.answered_marked
        )),
        Line::default(),
        Line::from(Span::styled(
            "Submit now? (y / any other key to cancel)",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).title(" Submit "))
    .render(popup, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{EmbeddedBank, QuestionBank, TestDescriptor, TestType};
    use crate::input::KeyBindings;
    use crate::session::{Command, Session};
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> App {
        let descriptor = TestDescriptor::new("ui", "UI Mock", TestType::Verbal, 7, 2);
        let qs = EmbeddedBank::with_seed(9).load(&descriptor).unwrap();
        App::new(Session::init(descriptor, qs).unwrap(), KeyBindings::default())
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| f.render_widget(app, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn renders_header_question_and_palette() {
        let app = app();
        let content = draw(&app);
        assert!(content.contains("UI Mock"));
        assert!(content.contains("Q 1/7"));
        assert!(content.contains("02:00"));
        assert!(content.contains("Question 1"));
        assert!(content.contains("Palette"));
    }

    #[test]
    fn paused_hides_the_question() {
        let mut app = app();
        app.session.handle(Command::Pause);
        let content = draw(&app);
        assert!(content.contains("PAUSED"));
        assert!(!content.contains("Question 1"));
    }

    #[test]
    fn fullscreen_drops_the_palette() {
        let mut app = app();
        app.fullscreen = true;
        let content = draw(&app);
        assert!(!content.contains("Palette"));
    }

    #[test]
    fn calculator_and_confirm_popups() {
        let mut app = app();
        app.calculator_visible = true;
        app.state = AppState::ConfirmSubmit;
        let content = draw(&app);
        assert!(content.contains("Calculator"));
        assert!(content.contains("Submit now?"));
    }

    #[test]
    fn centered_rect_is_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_rect(50, 50, area);
        assert!(r.x >= 25 && r.right() <= 75);
        assert!(r.y >= 10 && r.bottom() <= 30);
    }
}
