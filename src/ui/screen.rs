use ratatui::Frame;

use crate::app::{App, AppState};
use crate::ui::results::ResultsView;

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Test-taking screen: header, question, palette and popups
pub struct TestScreen;

impl Screen for TestScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Results screen, shown once the session has ended
pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        match app.session.result() {
            Some(result) => f.render_widget(ResultsView { result }, f.area()),
            None => f.render_widget(app, f.area()),
        }
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Testing | AppState::ConfirmSubmit => Box::new(TestScreen),
        AppState::Results => Box::new(ResultsScreen),
    }
}
