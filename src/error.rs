//! Error types for the engagement engine.
//!
//! Statistical updates never fail: `insufficient_data` and `unknown` are
//! ordinary results. Errors only surface at the registry boundary (unknown
//! sessions, malformed observations, lifecycle misuse) and while loading
//! configuration.

use thiserror::Error;

/// Errors returned by session and ingest operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The referenced session does not exist
    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// The referenced student has never been seen in the session
    #[error("Student {student_id} not found in session {session_id}")]
    StudentNotFound {
        session_id: String,
        student_id: String,
    },

    /// An observation field is outside its valid range
    #[error("Invalid {field}: {value} (expected a finite value in [0, 1])")]
    InvalidInput { field: &'static str, value: f64 },

    /// A session with this identifier already exists
    #[error("Session already exists: {session_id}")]
    SessionExists { session_id: String },

    /// The session has already ended and accepts no further changes
    #[error("Session already ended: {session_id}")]
    SessionEnded { session_id: String },

    /// The session must be ended before it can be released
    #[error("Session is still active: {session_id}")]
    SessionActive { session_id: String },

    /// The classifier task failed before producing a result
    #[error("Classifier task failed: {0}")]
    Classifier(String),
}

impl EngineError {
    pub(crate) fn session_not_found(session_id: &str) -> Self {
        Self::SessionNotFound {
            session_id: session_id.to_string(),
        }
    }

    /// Whether this error belongs to the "not found" class.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::SessionNotFound { .. } | EngineError::StudentNotFound { .. }
        )
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}
