use std::sync::mpsc::Sender;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::answers::AnswerState;
use crate::bank::{TestDescriptor, TestType};

/// What ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitTrigger {
    Manual,
    Timeout,
}

/// Record of a finished session. Built once, at the terminal transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub test_id: String,
    pub title: String,
    pub test_type: TestType,
    pub answers: Vec<AnswerState>,
    pub answered_count: usize,
    pub marked_count: usize,
    pub not_answered_count: usize,
    pub elapsed_seconds: u64,
    pub submitted_at: DateTime<Local>,
    pub trigger: SubmitTrigger,
}

impl SubmissionResult {
    pub fn build(
        descriptor: &TestDescriptor,
        answers: Vec<AnswerState>,
        remaining_seconds: u64,
        trigger: SubmitTrigger,
    ) -> Self {
        let answered_count = answers.iter().filter(|a| a.is_answered).count();
        let marked_count = answers.iter().filter(|a| a.is_marked).count();
        Self {
            test_id: descriptor.id.clone(),
            title: descriptor.title.clone(),
            test_type: descriptor.test_type,
            not_answered_count: answers.len() - answered_count,
            answered_count,
            marked_count,
            elapsed_seconds: descriptor.total_seconds().saturating_sub(remaining_seconds),
            submitted_at: Local::now(),
            trigger,
            answers,
        }
    }

    pub fn question_count(&self) -> usize {
        self.answers.len()
    }

    pub fn timed_out(&self) -> bool {
        self.trigger == SubmitTrigger::Timeout
    }
}

/// Receives the result of a session exactly once.
pub trait ResultSink {
    fn deliver(&mut self, result: &SubmissionResult);
}

impl ResultSink for Sender<SubmissionResult> {
    fn deliver(&mut self, result: &SubmissionResult) {
        if self.send(result.clone()).is_err() {
            tracing::warn!(test_id = %result.test_id, "result receiver dropped before delivery");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn answered(option: usize) -> AnswerState {
        AnswerState {
            selected_option: Some(option),
            is_answered: true,
            ..Default::default()
        }
    }

    #[test]
    fn build_counts_answers_and_elapsed_time() {
        let descriptor = TestDescriptor::new("t1", "Mock", TestType::Verbal, 4, 2);
        let marked = AnswerState {
            is_marked: true,
            ..Default::default()
        };
        let answers = vec![answered(1), marked, answered(0), AnswerState::default()];

        let result = SubmissionResult::build(&descriptor, answers, 45, SubmitTrigger::Manual);

        assert_eq!(result.answered_count, 2);
        assert_eq!(result.marked_count, 1);
        assert_eq!(result.not_answered_count, 2);
        assert_eq!(result.elapsed_seconds, 75);
        assert_eq!(result.question_count(), 4);
        assert!(!result.timed_out());
    }

    #[test]
    fn sender_sink_forwards_a_copy() {
        let descriptor = TestDescriptor::new("t2", "Mock", TestType::Aptitude, 1, 1);
        let result =
            SubmissionResult::build(&descriptor, vec![answered(2)], 0, SubmitTrigger::Timeout);

        let (mut tx, rx) = mpsc::channel();
        tx.deliver(&result);

        let received = rx.try_recv().unwrap();
        assert_eq!(received, result);
        assert!(received.timed_out());
    }

    #[test]
    fn result_serializes_trigger_in_kebab_case() {
        let descriptor = TestDescriptor::new("t3", "Mock", TestType::Reasoning, 1, 1);
        let result =
            SubmissionResult::build(&descriptor, vec![AnswerState::default()], 60, SubmitTrigger::Manual);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"trigger\":\"manual\""));

        let back: SubmissionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
