//! Core stream processing for the engagement engine.
//!
//! This module contains:
//! - Sliding windows for per-student samples
//! - Trend prediction and attention tracking over those windows
//! - Alert decisions with per-student cooldown
//! - The per-student stream state that ties them together

pub mod alerts;
pub mod attention;
pub mod stats;
pub mod stream;
pub mod trend;
pub mod window;

// Re-export commonly used types
pub use alerts::{Alert, AlertDecider, AlertKind, AlertLog, AlertOutcome, AlertPriority, AlertSummary};
pub use attention::{
    AttentionLevel, AttentionSnapshot, AttentionSummary, AttentionTracker, DistractionEvent,
};
pub use stream::{EnrichedObservation, FrameResult, FrameStatus, StudentStreamState};
pub use trend::{EngagementStats, Prediction, TrendDirection, TrendPredictor, TrendState};
pub use window::WindowBuffer;
