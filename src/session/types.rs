//! Session-level data returned by the registry.

use crate::core::{AttentionSummary, EngagementStats, EnrichedObservation, Prediction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub teacher_id: String,
    pub subject: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Registered students, in registration order
    pub student_ids: Vec<String>,
    pub total_observations: u64,
    pub alerts_generated: u64,
}

/// Summary computed when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    /// Mean over registered students of each student's mean engagement
    pub average_class_engagement: f64,
    pub duration_minutes: f64,
    /// Mean engagement per student with at least one usable observation
    pub student_engagement: BTreeMap<String, f64>,
}

/// Current state of one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub student_id: String,
    pub engagement_stats: Option<EngagementStats>,
    pub attention_stats: Option<AttentionSummary>,
    pub current_prediction: Prediction,
    pub observations: usize,
    pub no_face_frames: u64,
}

/// Per-student observation history of one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    pub session_id: String,
    /// `(student_id, observations)` in registration order; observations in
    /// arrival order
    pub students: Vec<(String, Vec<EnrichedObservation>)>,
}

impl SessionHistory {
    /// History of one student, if registered.
    pub fn student(&self, student_id: &str) -> Option<&[EnrichedObservation]> {
        self.students
            .iter()
            .find(|(id, _)| id == student_id)
            .map(|(_, history)| history.as_slice())
    }

    /// Every observation of every student.
    pub fn all(&self) -> impl Iterator<Item = &EnrichedObservation> {
        self.students.iter().flat_map(|(_, history)| history.iter())
    }
}

/// Everything retained about an ended session, handed off on release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionArchive {
    pub summary: SessionSummary,
    pub history: SessionHistory,
}
