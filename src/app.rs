use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tracing::debug;

use crate::answers::Confidence;
use crate::calculator::Calculator;
use crate::input::{Action, KeyBindings, RouterContext};
use crate::session::{Command, Outcome, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Testing,
    /// Waiting for `y` to confirm a manual submission.
    ConfirmSubmit,
    Results,
}

/// What the event loop should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session resumed; restart the tick schedule.
    ResetClock,
    Quit,
}

/// Terminal host around one session: UI-only state lives here, session
/// state lives in [`Session`].
#[derive(Debug)]
pub struct App {
    pub session: Session,
    pub state: AppState,
    pub calculator: Calculator,
    pub calculator_visible: bool,
    pub fullscreen: bool,
    pub bindings: KeyBindings,
}

impl App {
    pub fn new(session: Session, bindings: KeyBindings) -> Self {
        Self {
            session,
            state: AppState::Testing,
            calculator: Calculator::new(),
            calculator_visible: false,
            fullscreen: false,
            bindings,
        }
    }

    pub fn router_context(&self) -> RouterContext {
        RouterContext {
            active: self.session.is_active(),
            paused: self.session.is_paused(),
            calculator_visible: self.calculator_visible,
            option_count: self.session.current_question().options.len(),
        }
    }

    pub fn on_tick(&mut self) {
        let outcome = self.session.handle(Command::Tick);
        self.absorb(outcome);
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        match self.state {
            AppState::Results => self.on_results_key(key),
            AppState::ConfirmSubmit => self.on_confirm_key(key),
            AppState::Testing => self.on_testing_key(key),
        }
    }

    fn on_testing_key(&mut self, key: KeyEvent) -> Flow {
        let Some(action) = self.bindings.route(key, &self.router_context()) else {
            return Flow::Continue;
        };
        debug!(?action, "key routed");

        match action {
            Action::Quit => return Flow::Quit,
            Action::Session(command) => {
                let outcome = self.session.handle(command);
                self.absorb(outcome);
            }
            Action::CycleConfidence => {
                let current = self.session.current_index();
                let level = Confidence::cycle(self.session.answer(current).and_then(|a| a.confidence));
                let outcome = self.session.handle(Command::SetConfidence(level));
                self.absorb(outcome);
            }
            Action::RequestSubmit => self.state = AppState::ConfirmSubmit,
            Action::TogglePause => {
                let command = if self.session.is_paused() {
                    Command::Resume
                } else {
                    Command::Pause
                };
                let outcome = self.session.handle(command);
                if command == Command::Resume && outcome == Outcome::Applied {
                    return Flow::ResetClock;
                }
            }
            Action::ToggleCalculator => self.calculator_visible = !self.calculator_visible,
            Action::ToggleFullscreen => self.fullscreen = !self.fullscreen,
            Action::Calculator(calc) => self.calculator.press(calc),
        }
        Flow::Continue
    }

    fn on_confirm_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                let outcome = self.session.handle(Command::Submit);
                self.state = AppState::Testing;
                self.absorb(outcome);
            }
            _ => self.state = AppState::Testing,
        }
        Flow::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => Flow::Quit,
            _ => Flow::Continue,
        }
    }

    /// Move to the results screen once the session has ended, whichever
    /// path ended it.
    fn absorb(&mut self, outcome: Outcome) {
        if outcome.is_submitted() || !self.session.is_active() {
            self.state = AppState::Results;
            self.calculator_visible = false;
        }
    }
}
