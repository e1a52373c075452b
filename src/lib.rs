//! Engagement Monitor - real-time classroom engagement stream processing.
//!
//! This library turns per-student observations (an emotion label, a
//! confidence and an engagement score) into trend predictions, attention
//! metrics and rate-limited teacher alerts, and aggregates them into
//! per-session summaries.
//!
//! # Guarantees
//!
//! - **Per-student ordering**: observations for one student are applied in
//!   arrival order; different students never contend
//! - **Bounded state**: every window holds a fixed number of samples
//! - **No alert storms**: each student has one alert cooldown shared by all
//!   alert kinds
//! - **No partial errors**: statistical updates never fail; errors only come
//!   from unknown sessions, malformed input and lifecycle misuse
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       SessionRegistry                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌────────────────────────────────────┐    │
//! │  │ Classifier  │──▶│        StudentStreamState          │    │
//! │  │ (pipeline)  │   │  ┌──────────┐  ┌────────────────┐  │    │
//! │  └─────────────┘   │  │  Trend   │  │   Attention    │  │    │
//! │                    │  │Predictor │  │    Tracker     │  │    │
//! │                    │  └────┬─────┘  └───────┬────────┘  │    │
//! │                    │       └──▶ AlertDecider ◀┘          │    │
//! │                    └──────────────┬─────────────────────┘    │
//! │                                   ▼                          │
//! │  ┌─────────────┐          ┌─────────────┐   ┌────────────┐   │
//! │  │  Analytics  │◀─history─│  AlertLog   │──▶│ AlertSink  │   │
//! │  └─────────────┘          └─────────────┘   └────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use engagement_monitor::{Config, Emotion, Observation, SessionRegistry};
//!
//! let registry = SessionRegistry::new(Config::default());
//! registry.create_session("S1", "T1", "Math").unwrap();
//!
//! let observation = Observation::new(Emotion::Happy, 0.9, 0.95, Utc::now());
//! let result = registry.ingest("S1", "alice", observation).unwrap();
//! assert_eq!(result.focus_score, 95);
//!
//! let summary = registry.end_session("S1").unwrap();
//! assert_eq!(summary.session.student_ids, vec!["alice"]);
//! ```

pub mod analytics;
pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod observation;
pub mod pipeline;
pub mod session;
pub mod sink;
pub mod telemetry;

// Re-export key types at crate root for convenience
pub use analytics::{AnalyticsReport, Topic};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, Thresholds};
pub use core::{
    Alert, AlertKind, AlertPriority, AttentionLevel, FrameResult, FrameStatus, Prediction,
    TrendDirection, TrendState,
};
pub use error::{ConfigError, EngineError};
pub use observation::{Classification, Emotion, Observation};
pub use pipeline::{Classifier, FramePipeline};
pub use session::{SessionArchive, SessionRegistry, SessionSnapshot, SessionSummary};
pub use sink::{alert_channel, AlertSink, ChannelAlertSink};
pub use telemetry::{EngineStatsSnapshot, SharedEngineStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
