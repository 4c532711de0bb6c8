use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::app_dirs::AppDirs;
use crate::bank::TestDescriptor;
use crate::error::StoreError;
use crate::submission::{ResultSink, SubmissionResult};

/// Key-value persistence the session engine relies on.
pub trait SessionStore {
    fn load_session(&self, key: &str) -> Result<Option<TestDescriptor>, StoreError>;
    fn save_session(&self, key: &str, descriptor: &TestDescriptor) -> Result<(), StoreError>;
    fn save_result(&self, result: &SubmissionResult) -> Result<(), StoreError>;
    /// Newest first.
    fn recent_results(&self, limit: usize) -> Result<Vec<SubmissionResult>, StoreError>;
}

/// SQLite-backed store for test descriptors and submitted results
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at the default location, creating it if needed
    pub fn new() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| "testdesk.db".into());
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                key TEXT PRIMARY KEY,
                descriptor TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                test_id TEXT NOT NULL,
                title TEXT NOT NULL,
                submitted_at TEXT NOT NULL,
                elapsed_seconds INTEGER NOT NULL,
                answered_count INTEGER NOT NULL,
                marked_count INTEGER NOT NULL,
                not_answered_count INTEGER NOT NULL,
                submit_trigger TEXT NOT NULL,
                payload TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_test_id ON results(test_id)",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Delete all stored results. Descriptors are kept.
    pub fn clear_results(&self) -> Result<usize, StoreError> {
        Ok(self.conn.execute("DELETE FROM results", [])?)
    }
}

impl SessionStore for SqliteStore {
    fn load_session(&self, key: &str) -> Result<Option<TestDescriptor>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT descriptor FROM sessions WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn save_session(&self, key: &str, descriptor: &TestDescriptor) -> Result<(), StoreError> {
        let json = serde_json::to_string(descriptor)?;
        self.conn.execute(
            r#"
            INSERT INTO sessions (key, descriptor) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET descriptor = excluded.descriptor,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, json],
        )?;
        Ok(())
    }

    fn save_result(&self, result: &SubmissionResult) -> Result<(), StoreError> {
        let payload = serde_json::to_string(result)?;
        self.conn.execute(
            r#"
            INSERT INTO results
            (test_id, title, submitted_at, elapsed_seconds, answered_count, marked_count,
             not_answered_count, submit_trigger, payload)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                result.test_id,
                result.title,
                result.submitted_at.to_rfc3339(),
                result.elapsed_seconds as i64,
                result.answered_count as i64,
                result.marked_count as i64,
                result.not_answered_count as i64,
                result.trigger.to_string(),
                payload,
            ],
        )?;
        Ok(())
    }

    fn recent_results(&self, limit: usize) -> Result<Vec<SubmissionResult>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM results ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map([limit as i64], |row| row.get::<_, String>(0))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(serde_json::from_str(&row?)?);
        }
        Ok(results)
    }
}

/// In-process store, handy for tests and for hosts without a disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, TestDescriptor>>,
    results: Mutex<Vec<SubmissionResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load_session(&self, key: &str) -> Result<Option<TestDescriptor>, StoreError> {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        Ok(sessions.get(key).cloned())
    }

    fn save_session(&self, key: &str, descriptor: &TestDescriptor) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.insert(key.to_string(), descriptor.clone());
        Ok(())
    }

    fn save_result(&self, result: &SubmissionResult) -> Result<(), StoreError> {
        let mut results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        results.push(result.clone());
        Ok(())
    }

    fn recent_results(&self, limit: usize) -> Result<Vec<SubmissionResult>, StoreError> {
        let results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        Ok(results.iter().rev().take(limit).cloned().collect())
    }
}

/// Persists each delivered result into a [`SessionStore`].
pub struct StoreSink<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> StoreSink<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: SessionStore> ResultSink for StoreSink<S> {
    fn deliver(&mut self, result: &SubmissionResult) {
        match self.store.save_result(result) {
            Ok(()) => tracing::debug!(test_id = %result.test_id, "result saved"),
            Err(err) => tracing::warn!(test_id = %result.test_id, %err, "failed to save result"),
        }
    }
}

/// One CSV row per result, in the order given.
pub fn export_results_csv<W: Write>(results: &[SubmissionResult], writer: W) -> Result<(), StoreError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record([
        "submitted_at",
        "test_id",
        "title",
        "test_type",
        "questions",
        "answered",
        "marked",
        "not_answered",
        "elapsed_seconds",
        "trigger",
    ])?;

    for r in results {
        out.write_record([
            r.submitted_at.to_rfc3339(),
            r.test_id.clone(),
            r.title.clone(),
            r.test_type.to_string(),
            r.question_count().to_string(),
            r.answered_count.to_string(),
            r.marked_count.to_string(),
            r.not_answered_count.to_string(),
            r.elapsed_seconds.to_string(),
            r.trigger.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}
