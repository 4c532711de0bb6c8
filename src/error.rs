//! Error types for session setup, question loading and persistence.
//!
//! Only configuration problems are fatal. Bad indices, redundant clears and
//! input after the session has ended are not errors at all; they come back
//! as [`crate::session::Rejection`] inside an ignored outcome.

use thiserror::Error;

/// Reasons a session refuses to start. No session state exists afterwards.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Descriptor is missing its id or title.
    #[error("test descriptor is missing an id or title")]
    EmptyDescriptor,

    /// Descriptor asks for zero questions.
    #[error("test '{test_id}' has no questions")]
    NoQuestions { test_id: String },

    /// Duration must be a positive number of minutes.
    #[error("test '{test_id}' has a non-positive duration")]
    InvalidDuration { test_id: String },

    /// The question sequence does not match the descriptor.
    #[error("test '{test_id}' expects {expected} questions, got {actual}")]
    QuestionCountMismatch {
        test_id: String,
        expected: usize,
        actual: usize,
    },

    /// A question has the wrong number of options or an empty one.
    #[error("question {ordinal} must have {expected} non-empty options")]
    InvalidOptions { ordinal: usize, expected: usize },
}

/// Errors raised while producing questions for a test.
#[derive(Debug, Error)]
pub enum BankError {
    /// No embedded bank exists for the requested file.
    #[error("question bank not found: {name}")]
    UnknownBank { name: String },

    /// The bank file is not valid JSON for the expected layout.
    #[error("failed to parse question bank {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The bank parsed but contains no usable templates.
    #[error("question bank {name} has no questions")]
    Empty { name: String },
}

/// Errors from the result and session store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode or decode stored record: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}
