//! Per-student stream state.
//!
//! A `StudentStreamState` owns everything that changes when one student's
//! observation is applied: the trend window, the attention window, the alert
//! cooldown and the session history. It is only ever mutated while that
//! student's own observation is being processed.

use crate::config::Config;
use crate::core::alerts::{Alert, AlertDecider, AlertOutcome};
use crate::core::attention::{AttentionSnapshot, AttentionSummary, AttentionTracker};
use crate::core::stats;
use crate::core::trend::{EngagementStats, Prediction, TrendPredictor};
use crate::observation::{Emotion, Observation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a frame carried a usable sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Success,
    NoFace,
}

/// Response for one ingested frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub student_id: String,
    pub status: FrameStatus,
    pub emotion: Emotion,
    pub confidence: f64,
    pub engagement_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Prediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention: Option<AttentionSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
    pub recommendation: String,
    pub focus_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One usable observation together with what was derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedObservation {
    pub emotion: Emotion,
    pub confidence: f64,
    pub engagement_score: f64,
    pub timestamp: DateTime<Utc>,
    pub prediction: Prediction,
    pub attention: AttentionSnapshot,
    pub alert_fired: bool,
}

/// Result of applying an observation, before it is shaped into a response.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamUpdate {
    pub result: FrameResult,
    pub alert_outcome: AlertOutcome,
}

const NO_FACE_RECOMMENDATION: &str = "Position your face in the camera frame";
const NO_FACE_MESSAGE: &str = "Please position your face in camera";

/// Pick the student-facing recommendation for a frame.
pub fn recommendation(emotion: Emotion, engagement_score: f64) -> &'static str {
    if engagement_score > 0.8 {
        "You're on fire! Keep up the excellent focus!"
    } else if engagement_score > 0.6 {
        "Great job! You're doing well."
    } else if engagement_score > 0.4 {
        "Try taking notes to stay engaged."
    } else if emotion.is_distressed() {
        "Feeling confused? Don't hesitate to ask questions."
    } else {
        "Take a deep breath and refocus on the content."
    }
}

/// Engagement as a 0-100 focus score.
pub fn focus_score(engagement_score: f64) -> u32 {
    (engagement_score * 100.0).round().clamp(0.0, 100.0) as u32
}

/// Trend, attention and alert state for one student in one session.
#[derive(Debug, Clone)]
pub struct StudentStreamState {
    session_id: String,
    student_id: String,
    trend: TrendPredictor,
    attention: AttentionTracker,
    alerts: AlertDecider,
    history: Vec<EnrichedObservation>,
    no_face_frames: u64,
}

impl StudentStreamState {
    /// Create an empty stream for one student.
    pub fn new(session_id: &str, student_id: &str, config: &Config) -> Self {
        Self {
            session_id: session_id.to_string(),
            student_id: student_id.to_string(),
            trend: TrendPredictor::new(
                config.trend_window,
                config.thresholds.clone(),
                config.sampling_interval_secs(),
            ),
            attention: AttentionTracker::new(config),
            alerts: AlertDecider::new(config.thresholds.clone(), config.alert_cooldown),
            history: Vec::new(),
            no_face_frames: 0,
        }
    }

    /// Apply one validated observation. `now` drives the alert cooldown.
    pub fn apply(&mut self, observation: &Observation, now: DateTime<Utc>) -> StreamUpdate {
        if observation.is_no_face() {
            self.no_face_frames += 1;
            return StreamUpdate {
                result: FrameResult {
                    student_id: self.student_id.clone(),
                    status: FrameStatus::NoFace,
                    emotion: Emotion::NoFace,
                    confidence: 0.0,
                    engagement_score: 0.0,
                    prediction: None,
                    attention: None,
                    alert: None,
                    recommendation: NO_FACE_RECOMMENDATION.to_string(),
                    focus_score: 0,
                    message: Some(NO_FACE_MESSAGE.to_string()),
                    timestamp: observation.timestamp,
                },
                alert_outcome: AlertOutcome::Quiet,
            };
        }

        let score = observation.engagement_score;
        let prediction = self.trend.update(score);
        let attention = self.attention.update(score, observation.timestamp);
        let alert_outcome = self.alerts.evaluate(
            &self.session_id,
            &self.student_id,
            observation,
            &prediction,
            now,
        );
        let alert = match &alert_outcome {
            AlertOutcome::Fired(alert) => Some(alert.clone()),
            _ => None,
        };

        self.history.push(EnrichedObservation {
            emotion: observation.emotion,
            confidence: observation.confidence,
            engagement_score: score,
            timestamp: observation.timestamp,
            prediction: prediction.clone(),
            attention: attention.clone(),
            alert_fired: alert.is_some(),
        });

        StreamUpdate {
            result: FrameResult {
                student_id: self.student_id.clone(),
                status: FrameStatus::Success,
                emotion: observation.emotion,
                confidence: observation.confidence,
                engagement_score: score,
                prediction: Some(prediction),
                attention: Some(attention),
                alert,
                recommendation: recommendation(observation.emotion, score).to_string(),
                focus_score: focus_score(score),
                message: None,
                timestamp: observation.timestamp,
            },
            alert_outcome,
        }
    }

    /// Every usable observation so far, in arrival order.
    pub fn history(&self) -> &[EnrichedObservation] {
        &self.history
    }

    /// Mean engagement over the whole session history.
    pub fn mean_engagement(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let scores: Vec<f64> = self.history.iter().map(|o| o.engagement_score).collect();
        Some(stats::mean(&scores))
    }

    /// Statistics over the trend window.
    pub fn engagement_stats(&self) -> Option<EngagementStats> {
        self.trend.stats()
    }

    /// Summary of the attention window.
    pub fn attention_summary(&self) -> Option<AttentionSummary> {
        self.attention.summary()
    }

    /// Prediction for the current trend window.
    pub fn current_prediction(&self) -> Prediction {
        self.trend.predict()
    }

    /// Frames ingested without a face.
    pub fn no_face_frames(&self) -> u64 {
        self.no_face_frames
    }

    /// The student this stream belongs to.
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Consume the state and keep only its history.
    pub fn into_history(self) -> Vec<EnrichedObservation> {
        self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::alerts::{AlertKind, AlertPriority};
    use crate::core::trend::TrendState;
    use chrono::Duration;

    fn state() -> StudentStreamState {
        StudentStreamState::new("S1", "alice", &Config::default())
    }

    #[test]
    fn test_recommendation_table() {
        assert!(recommendation(Emotion::Happy, 0.95).contains("on fire"));
        assert!(recommendation(Emotion::Neutral, 0.7).contains("Great job"));
        assert!(recommendation(Emotion::Neutral, 0.5).contains("taking notes"));
        assert!(recommendation(Emotion::Sad, 0.3).contains("confused"));
        assert!(recommendation(Emotion::Angry, 0.1).contains("deep breath"));
        // Engagement thresholds are checked before emotion.
        assert!(recommendation(Emotion::Fear, 0.5).contains("taking notes"));
    }

    #[test]
    fn test_focus_score_rounds() {
        assert_eq!(focus_score(0.856), 86);
        assert_eq!(focus_score(0.3), 30);
        assert_eq!(focus_score(0.0), 0);
        assert_eq!(focus_score(1.0), 100);
    }

    #[test]
    fn test_no_face_bypasses_everything() {
        let mut s = state();
        let now = Utc::now();
        let update = s.apply(&Observation::no_face(now), now);

        assert_eq!(update.result.status, FrameStatus::NoFace);
        assert_eq!(update.result.focus_score, 0);
        assert!(update.result.prediction.is_none());
        assert!(update.result.alert.is_none());
        assert_eq!(update.alert_outcome, AlertOutcome::Quiet);
        assert!(s.history().is_empty());
        assert_eq!(s.no_face_frames(), 1);
        assert!(s.engagement_stats().is_none());
    }

    #[test]
    fn test_apply_records_history() {
        let mut s = state();
        let start = Utc::now();
        let mut updates = Vec::new();
        for (i, score) in [0.9, 0.85, 0.6].into_iter().enumerate() {
            let at = start + Duration::seconds(2 * i as i64);
            updates.push(s.apply(&Observation::new(Emotion::Neutral, 0.8, score, at), at));
        }

        assert_eq!(s.history().len(), 3);
        assert_eq!(s.history()[0].engagement_score, 0.9);
        assert_eq!(s.history()[2].prediction.state, TrendState::Warning);
        assert!((s.mean_engagement().unwrap() - (0.9 + 0.85 + 0.6) / 3.0).abs() < 1e-9);

        // The warning prediction on the third frame raises a warning alert.
        assert!(updates[0].result.alert.is_none());
        assert!(updates[1].result.alert.is_none());
        let alert = updates[2].result.alert.clone().expect("warning alert");
        assert_eq!(alert.kind, AlertKind::Warning);
        assert_eq!(alert.priority, AlertPriority::Medium);
        assert_eq!(alert.message, "alice engagement declining. Critical in 0.1 min");
        assert!(s.history()[2].alert_fired);
    }

    #[test]
    fn test_apply_emits_critical_alert() {
        let mut s = state();
        let now = Utc::now();
        let update = s.apply(&Observation::new(Emotion::Angry, 0.9, 0.1, now), now);

        let alert = update.result.alert.expect("critical alert");
        assert_eq!(alert.kind, AlertKind::Critical);
        assert_eq!(alert.session_id, "S1");
        assert_eq!(alert.student_id, "alice");
        assert!(s.history()[0].alert_fired);
        assert_eq!(update.result.focus_score, 10);
    }
}
