//! Engine counters.
//!
//! This module tracks how much work the engine has done so operators can
//! see ingestion volume and alert pressure at a glance.

pub mod counters;

// Re-export commonly used types
pub use counters::{create_shared_stats, EngineStats, EngineStatsSnapshot, SharedEngineStats};
