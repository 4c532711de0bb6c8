use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::answers::{AnswerState, AnswerStore, Confidence};
use crate::bank::{Question, TestDescriptor};
use crate::error::SessionError;
use crate::navigation::Navigator;
use crate::palette::{status_of, PaletteCounts, PaletteStatus};
use crate::submission::{ResultSink, SubmissionResult, SubmitTrigger};
use crate::timer::{SessionTimer, TimerTick};

/// Whether an accepted operation actually changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

/// Why an operation was ignored. None of these are errors for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Rejection {
    /// Question or option index outside the test.
    OutOfRange,
    /// Nothing to do, e.g. clearing an unanswered question.
    NoOp,
    /// The session already ended.
    InvalidTransition,
    /// The session is paused.
    Paused,
}

/// Everything a host can ask of a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tick,
    GoTo(usize),
    Next,
    Previous,
    /// Select an option on the current question.
    Select(usize),
    ClearResponse,
    ToggleMark,
    SetConfidence(Confidence),
    Pause,
    Resume,
    Submit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Unchanged,
    Ignored(Rejection),
    /// The terminal transition happened during this command.
    Submitted(SubmissionResult),
}

impl Outcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Outcome::Submitted(_))
    }
}

impl From<Result<Change, Rejection>> for Outcome {
    fn from(res: Result<Change, Rejection>) -> Self {
        match res {
            Ok(Change::Applied) => Outcome::Applied,
            Ok(Change::Unchanged) => Outcome::Unchanged,
            Err(rejection) => Outcome::Ignored(rejection),
        }
    }
}

/// One timed attempt at a test, from start to submission or timeout.
///
/// All mutation goes through `&mut self`, so a submission triggered by the
/// clock and one triggered by the candidate can never both run: whichever
/// reaches [`Session::submit`] first flips the session inactive and the other
/// is ignored.
pub struct Session {
    descriptor: Arc<TestDescriptor>,
    questions: Arc<[Question]>,
    answers: AnswerStore,
    timer: SessionTimer,
    navigator: Navigator,
    active: bool,
    result: Option<SubmissionResult>,
    sink: Option<Box<dyn ResultSink + Send>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("test_id", &self.descriptor.id)
            .field("current_index", &self.navigator.current())
            .field("remaining_seconds", &self.timer.remaining_seconds())
            .field("paused", &self.timer.is_paused())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Validate the descriptor against its questions and start the clock.
    pub fn init(descriptor: TestDescriptor, questions: Vec<Question>) -> Result<Self, SessionError> {
        validate(&descriptor, &questions)?;

        let option_counts = questions.iter().map(|q| q.options.len()).collect();
        let session = Self {
            answers: AnswerStore::new(option_counts),
            timer: SessionTimer::new(descriptor.total_seconds()),
            navigator: Navigator::new(questions.len()),
            questions: questions.into(),
            descriptor: Arc::new(descriptor),
            active: true,
            result: None,
            sink: None,
        };

        info!(
            test_id = %session.descriptor.id,
            questions = session.questions.len(),
            duration_minutes = session.descriptor.duration_minutes,
            "session started"
        );
        Ok(session)
    }

    /// Where the result goes when the session ends.
    pub fn with_sink(mut self, sink: Box<dyn ResultSink + Send>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn handle(&mut self, command: Command) -> Outcome {
        if !self.active {
            debug!(?command, "ignored: session has ended");
            return Outcome::Ignored(Rejection::InvalidTransition);
        }

        let outcome = match command {
            Command::Tick => self.tick(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Submit => self.submit(),
            Command::GoTo(index) => self.go_to(index),
            Command::Next => self.guarded(|s| s.navigator.next(&mut s.answers)),
            Command::Previous => self.guarded(|s| s.navigator.previous(&mut s.answers)),
            Command::Select(option) => self.select_option(self.current_index(), option),
            Command::ClearResponse => self.clear_response(self.current_index()),
            Command::ToggleMark => self.toggle_mark(self.current_index()),
            Command::SetConfidence(level) => self.set_confidence(self.current_index(), level),
        };

        if let Outcome::Ignored(rejection) = &outcome {
            debug!(?command, %rejection, "command ignored");
        }
        outcome
    }

    /// One second of wall-clock time. Expiry submits through the same path
    /// as a manual submit.
    pub fn tick(&mut self) -> Outcome {
        if !self.active {
            return Outcome::Ignored(Rejection::InvalidTransition);
        }
        match self.timer.tick() {
            TimerTick::Counted => {
                self.navigator.record_second();
                Outcome::Applied
            }
            TimerTick::Expired => {
                self.navigator.record_second();
                info!(test_id = %self.descriptor.id, "time expired");
                self.finish(SubmitTrigger::Timeout)
            }
            TimerTick::Ignored => Outcome::Ignored(Rejection::Paused),
        }
    }

    pub fn pause(&mut self) -> Outcome {
        if !self.active {
            return Outcome::Ignored(Rejection::InvalidTransition);
        }
        if self.timer.pause() {
            info!(remaining = self.timer.remaining_seconds(), "session paused");
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }

    pub fn resume(&mut self) -> Outcome {
        if !self.active {
            return Outcome::Ignored(Rejection::InvalidTransition);
        }
        if self.timer.resume() {
            info!(remaining = self.timer.remaining_seconds(), "session resumed");
            Outcome::Applied
        } else {
            Outcome::Unchanged
        }
    }

    pub fn go_to(&mut self, index: usize) -> Outcome {
        self.guarded(|s| s.navigator.go_to(index, &mut s.answers))
    }

    pub fn select_option(&mut self, question: usize, option: usize) -> Outcome {
        self.guarded(|s| s.answers.select_option(question, option))
    }

    pub fn clear_response(&mut self, question: usize) -> Outcome {
        self.guarded(|s| s.answers.clear_response(question))
    }

    pub fn toggle_mark(&mut self, question: usize) -> Outcome {
        self.guarded(|s| s.answers.toggle_mark(question))
    }

    pub fn set_confidence(&mut self, question: usize, confidence: Confidence) -> Outcome {
        self.guarded(|s| s.answers.set_confidence(question, confidence))
    }

    /// Manual submission. Only the first call in the session's life has any
    /// effect.
    pub fn submit(&mut self) -> Outcome {
        if !self.active {
            return Outcome::Ignored(Rejection::InvalidTransition);
        }
        if self.timer.is_paused() {
            return Outcome::Ignored(Rejection::Paused);
        }
        self.finish(SubmitTrigger::Manual)
    }

    fn finish(&mut self, trigger: SubmitTrigger) -> Outcome {
        if !self.active {
            return Outcome::Ignored(Rejection::InvalidTransition);
        }
        self.active = false;
        self.navigator.flush(&mut self.answers);
        self.timer.stop();

        let result = SubmissionResult::build(
            &self.descriptor,
            self.answers.snapshot(),
            self.timer.remaining_seconds(),
            trigger,
        );
        info!(
            test_id = %result.test_id,
            %trigger,
            answered = result.answered_count,
            marked = result.marked_count,
            elapsed = result.elapsed_seconds,
            "session submitted"
        );

        if let Some(sink) = self.sink.as_mut() {
            sink.deliver(&result);
        }
        self.result = Some(result.clone());
        Outcome::Submitted(result)
    }

    /// Run a mutation only while the session is live and unpaused.
    fn guarded<F>(&mut self, op: F) -> Outcome
    where
        F: FnOnce(&mut Self) -> Result<Change, Rejection>,
    {
        if !self.active {
            return Outcome::Ignored(Rejection::InvalidTransition);
        }
        if self.timer.is_paused() {
            return Outcome::Ignored(Rejection::Paused);
        }
        op(self).into()
    }

    /// End the session's life. Returns the result if it was submitted.
    pub fn teardown(self) -> Option<SubmissionResult> {
        if self.active {
            info!(
                test_id = %self.descriptor.id,
                remaining = self.timer.remaining_seconds(),
                "session abandoned before submission"
            );
        }
        self.result
    }

    pub fn descriptor(&self) -> &TestDescriptor {
        &self.descriptor
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.navigator.current()]
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.navigator.current()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.timer.remaining_seconds()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds()
    }

    pub fn is_paused(&self) -> bool {
        self.timer.is_paused()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Live and accepting input.
    pub fn is_live(&self) -> bool {
        self.active && !self.timer.is_paused()
    }

    pub fn answer(&self, question: usize) -> Option<&AnswerState> {
        self.answers.get(question)
    }

    pub fn answers(&self) -> Vec<AnswerState> {
        self.answers.snapshot()
    }

    /// Seconds on the current question that have not been flushed yet.
    pub fn pending_seconds(&self) -> u64 {
        self.navigator.pending_seconds()
    }

    pub fn status_of(&self, question: usize) -> Option<PaletteStatus> {
        self.answers
            .get(question)
            .map(|state| status_of(state, question == self.navigator.current()))
    }

    pub fn statuses(&self) -> Vec<PaletteStatus> {
        (0..self.question_count())
            .filter_map(|i| self.status_of(i))
            .collect()
    }

    pub fn palette(&self) -> PaletteCounts {
        PaletteCounts::from_statuses(self.statuses())
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }
}

fn validate(descriptor: &TestDescriptor, questions: &[Question]) -> Result<(), SessionError> {
    if descriptor.id.trim().is_empty() || descriptor.title.trim().is_empty() {
        return Err(SessionError::EmptyDescriptor);
    }
    if descriptor.questions == 0 {
        return Err(SessionError::NoQuestions {
            test_id: descriptor.id.clone(),
        });
    }
    if descriptor.duration_minutes == 0 || descriptor.duration_minutes.checked_mul(60).is_none() {
        return Err(SessionError::InvalidDuration {
            test_id: descriptor.id.clone(),
        });
    }
    if questions.len() != descriptor.questions {
        return Err(SessionError::QuestionCountMismatch {
            test_id: descriptor.id.clone(),
            expected: descriptor.questions,
            actual: questions.len(),
        });
    }

    let expected = descriptor.test_type.options_per_question();
    if let Some(bad) = questions
        .iter()
        .find(|q| q.options.len() != expected || q.options.iter().any(|o| o.trim().is_empty()))
    {
        return Err(SessionError::InvalidOptions {
            ordinal: bad.ordinal,
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::TestType;
    use assert_matches::assert_matches;

    fn questions(n: usize) -> Vec<Question> {
        (1..=n)
            .map(|i| Question {
                id: format!("q{i}"),
                ordinal: i,
                prompt: format!("Question {i}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            })
            .collect()
    }

    fn session(n: usize, minutes: u64) -> Session {
        let descriptor = TestDescriptor::new("t", "Mock", TestType::Aptitude, n, minutes);
        Session::init(descriptor, questions(n)).unwrap()
    }

    #[test]
    fn init_starts_active_at_first_question() {
        let s = session(3, 2);
        assert!(s.is_active());
        assert!(!s.is_paused());
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.remaining_seconds(), 120);
        assert_eq!(s.status_of(0), Some(PaletteStatus::Current));
        assert_eq!(s.status_of(1), Some(PaletteStatus::NotVisited));
    }

    #[test]
    fn init_rejects_bad_configuration() {
        let d = TestDescriptor::new("", "Mock", TestType::Aptitude, 1, 1);
        assert_matches!(Session::init(d, questions(1)), Err(SessionError::EmptyDescriptor));

        let d = TestDescriptor::new("t", "Mock", TestType::Aptitude, 0, 1);
        assert_matches!(Session::init(d, vec![]), Err(SessionError::NoQuestions { .. }));

        let d = TestDescriptor::new("t", "Mock", TestType::Aptitude, 1, 0);
        assert_matches!(Session::init(d, questions(1)), Err(SessionError::InvalidDuration { .. }));

        let d = TestDescriptor::new("t", "Mock", TestType::Aptitude, 1, u64::MAX / 59);
        assert_matches!(Session::init(d, questions(1)), Err(SessionError::InvalidDuration { .. }));

        let d = TestDescriptor::new("t", "Mock", TestType::Aptitude, 1, u64::MAX / 60);
        assert!(Session::init(d, questions(1)).is_ok());

        let d = TestDescriptor::new("t", "Mock", TestType::Aptitude, 3, 1);
        assert_matches!(
            Session::init(d, questions(2)),
            Err(SessionError::QuestionCountMismatch { expected: 3, actual: 2, .. })
        );

        let mut qs = questions(2);
        qs[1].options.pop();
        let d = TestDescriptor::new("t", "Mock", TestType::Aptitude, 2, 1);
        assert_matches!(
            Session::init(d, qs),
            Err(SessionError::InvalidOptions { ordinal: 2, expected: 4 })
        );
    }

    #[test]
    fn paused_session_rejects_mutation_but_accepts_resume() {
        let mut s = session(2, 1);
        assert_eq!(s.handle(Command::Pause), Outcome::Applied);
        assert_eq!(s.handle(Command::Pause), Outcome::Unchanged);

        assert_eq!(s.handle(Command::Select(0)), Outcome::Ignored(Rejection::Paused));
        assert_eq!(s.handle(Command::Next), Outcome::Ignored(Rejection::Paused));
        assert_eq!(s.handle(Command::Tick), Outcome::Ignored(Rejection::Paused));
        assert_eq!(s.handle(Command::Submit), Outcome::Ignored(Rejection::Paused));
        assert_eq!(s.pending_seconds(), 0);

        assert_eq!(s.handle(Command::Resume), Outcome::Applied);
        assert_eq!(s.handle(Command::Select(0)), Outcome::Applied);
    }

    #[test]
    fn submit_happens_once() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut s = session(2, 1).with_sink(Box::new(tx));

        assert!(s.handle(Command::Submit).is_submitted());
        assert_eq!(s.handle(Command::Submit), Outcome::Ignored(Rejection::InvalidTransition));
        assert_eq!(s.handle(Command::Tick), Outcome::Ignored(Rejection::InvalidTransition));
        assert_eq!(s.handle(Command::Resume), Outcome::Ignored(Rejection::InvalidTransition));

        assert_eq!(rx.try_iter().count(), 1);
        assert!(!s.is_active());
        assert_eq!(s.result().unwrap().trigger, SubmitTrigger::Manual);
    }

    #[test]
    fn frozen_session_ignores_answers() {
        let mut s = session(2, 1);
        s.handle(Command::Select(1));
        s.handle(Command::Submit);
        let before = s.answers();

        assert_eq!(s.handle(Command::ClearResponse), Outcome::Ignored(Rejection::InvalidTransition));
        assert_eq!(s.handle(Command::ToggleMark), Outcome::Ignored(Rejection::InvalidTransition));
        assert_eq!(s.answers(), before);
    }

    #[test]
    fn teardown_returns_result_only_after_submission() {
        let s = session(1, 1);
        assert!(s.teardown().is_none());

        let mut s = session(1, 1);
        s.submit();
        let result = s.teardown().unwrap();
        assert_eq!(result.test_id, "t");
    }

    #[test]
    fn palette_follows_cursor_and_flags() {
        let mut s = session(4, 1);
        s.handle(Command::Select(2));
        s.handle(Command::Next);
        s.handle(Command::ToggleMark);
        s.handle(Command::Next);

        assert_eq!(
            s.statuses(),
            vec![
                PaletteStatus::Answered,
                PaletteStatus::Marked,
                PaletteStatus::Current,
                PaletteStatus::NotVisited
            ]
        );
        let counts = s.palette();
        assert_eq!(counts.answered, 1);
        assert_eq!(counts.marked, 1);
        assert_eq!(counts.total(), 4);
    }
}
