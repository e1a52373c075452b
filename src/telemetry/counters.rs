//! Lock-free counters for engine activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the lifetime of the engine.
#[derive(Debug)]
pub struct EngineStats {
    /// Observations accepted by `ingest`, including no-face frames
    observations: AtomicU64,
    /// Frames in which no face was detected
    no_face_frames: AtomicU64,
    /// Alerts emitted
    alerts_emitted: AtomicU64,
    /// Alerts withheld by a student's cooldown
    alerts_suppressed: AtomicU64,
    /// Sessions created
    sessions_created: AtomicU64,
    /// Sessions ended
    sessions_ended: AtomicU64,
    /// When counting started
    started_at: DateTime<Utc>,
}

impl EngineStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            observations: AtomicU64::new(0),
            no_face_frames: AtomicU64::new(0),
            alerts_emitted: AtomicU64::new(0),
            alerts_suppressed: AtomicU64::new(0),
            sessions_created: AtomicU64::new(0),
            sessions_ended: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Record an ingested observation.
    pub fn record_observation(&self) {
        self.observations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a frame without a face.
    pub fn record_no_face(&self) {
        self.no_face_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an emitted alert.
    pub fn record_alert_emitted(&self) {
        self.alerts_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an alert held back by a cooldown.
    pub fn record_alert_suppressed(&self) {
        self.alerts_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a new session.
    pub fn record_session_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ended session.
    pub fn record_session_ended(&self) {
        self.sessions_ended.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current counter values.
    pub fn snapshot(&self) -> EngineStatsSnapshot {
        EngineStatsSnapshot {
            observations: self.observations.load(Ordering::Relaxed),
            no_face_frames: self.no_face_frames.load(Ordering::Relaxed),
            alerts_emitted: self.alerts_emitted.load(Ordering::Relaxed),
            alerts_suppressed: self.alerts_suppressed.load(Ordering::Relaxed),
            sessions_created: self.sessions_created.load(Ordering::Relaxed),
            sessions_ended: self.sessions_ended.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Engine Statistics:\n\
             - Observations ingested: {}\n\
             - No-face frames: {}\n\
             - Alerts emitted: {}\n\
             - Alerts suppressed by cooldown: {}\n\
             - Sessions created: {}\n\
             - Sessions ended: {}\n\
             - Uptime: {} seconds",
            stats.observations,
            stats.no_face_frames,
            stats.alerts_emitted,
            stats.alerts_suppressed,
            stats.sessions_created,
            stats.sessions_ended,
            stats.uptime_secs
        )
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the engine counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatsSnapshot {
    pub observations: u64,
    pub no_face_frames: u64,
    pub alerts_emitted: u64,
    pub alerts_suppressed: u64,
    pub sessions_created: u64,
    pub sessions_ended: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared engine counters.
pub type SharedEngineStats = Arc<EngineStats>;

/// Create a new shared set of counters.
pub fn create_shared_stats() -> SharedEngineStats {
    Arc::new(EngineStats::new())
}
