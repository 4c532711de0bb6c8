use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::calculator::CalcKey;
use crate::session::Command;

/// What a key press means to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Forward to the session.
    Session(Command),
    /// Cycle the confidence annotation on the current answer.
    CycleConfidence,
    /// Ask to submit; the host confirms before sending `Command::Submit`.
    RequestSubmit,
    TogglePause,
    ToggleCalculator,
    ToggleFullscreen,
    Calculator(CalcKey),
    Quit,
}

/// Session and UI state the router needs to decide what a key means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterContext {
    pub active: bool,
    pub paused: bool,
    pub calculator_visible: bool,
    /// Option count of the current question.
    pub option_count: usize,
}

impl RouterContext {
    fn live(&self) -> bool {
        self.active && !self.paused
    }
}

/// Which modifiers count as the platform shortcut modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBindings {
    pub modifier: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            modifier: KeyModifiers::CONTROL | KeyModifiers::SUPER,
        }
    }
}

impl KeyBindings {
    fn has_modifier(&self, key: &KeyEvent) -> bool {
        key.modifiers.intersects(self.modifier)
    }

    /// Map a key event to an action, or `None` if the key means nothing here.
    pub fn route(&self, key: KeyEvent, ctx: &RouterContext) -> Option<Action> {
        if key.kind == KeyEventKind::Release {
            return None;
        }

        let modified = self.has_modifier(&key);

        match key.code {
            KeyCode::Esc => return Some(Action::Quit),
            KeyCode::Char(c) if modified && c.eq_ignore_ascii_case(&'q') => {
                return Some(Action::Quit)
            }
            // resume is the one thing a paused session still listens to
            KeyCode::Char(c) if modified && c.eq_ignore_ascii_case(&'p') => {
                return ctx.active.then_some(Action::TogglePause)
            }
            _ => {}
        }

        if !ctx.live() {
            return None;
        }

        if modified {
            return match key.code {
                KeyCode::Char(c) => match c.to_ascii_lowercase() {
                    'm' => Some(Action::Session(Command::ToggleMark)),
                    'c' => Some(Action::ToggleCalculator),
                    'f' => Some(Action::ToggleFullscreen),
                    's' => Some(Action::RequestSubmit),
                    // digits and anything else with the modifier are reserved
                    _ => None,
                },
                _ => None,
            };
        }

        if ctx.calculator_visible {
            if let Some(calc) = calculator_key(key.code) {
                return Some(Action::Calculator(calc));
            }
        }

        match key.code {
            KeyCode::Left => Some(Action::Session(Command::Previous)),
            KeyCode::Right => Some(Action::Session(Command::Next)),
            KeyCode::Backspace | KeyCode::Delete => Some(Action::Session(Command::ClearResponse)),
            KeyCode::Tab => Some(Action::CycleConfidence),
            // legacy terminals deliver Ctrl+M as a bare Enter
            KeyCode::Enter => Some(Action::Session(Command::ToggleMark)),
            KeyCode::Char(c @ '1'..='4') => {
                let option = c as usize - '1' as usize;
                (option < ctx.option_count).then_some(Action::Session(Command::Select(option)))
            }
            _ => None,
        }
    }
}

fn calculator_key(code: KeyCode) -> Option<CalcKey> {
    match code {
        KeyCode::Char(c @ '0'..='9') => c.to_digit(10).map(|d| CalcKey::Digit(d as u8)),
        KeyCode::Char('.') => Some(CalcKey::Point),
        KeyCode::Char('+') => Some(CalcKey::Add),
        KeyCode::Char('-') => Some(CalcKey::Subtract),
        KeyCode::Char('*') | KeyCode::Char('x') => Some(CalcKey::Multiply),
        KeyCode::Char('/') => Some(CalcKey::Divide),
        KeyCode::Char('=') | KeyCode::Enter => Some(CalcKey::Equals),
        KeyCode::Backspace => Some(CalcKey::Backspace),
        KeyCode::Delete => Some(CalcKey::Clear),
        _ => None,
    }
}
