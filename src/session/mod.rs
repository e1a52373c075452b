//! Session management.
//!
//! This module handles:
//! - Session lifecycle (create, end, release)
//! - Student registration and observation ingest
//! - Session, student and alert queries

pub mod registry;
pub mod types;

// Re-export commonly used types
pub use registry::SessionRegistry;
pub use types::{SessionArchive, SessionHistory, SessionSnapshot, SessionSummary, StudentSummary};
