//! Alert decisions and the shared recent-alerts history.
//!
//! Every student has one cooldown clock shared by all alert kinds. Any alert
//! restarts it, and nothing fires for that student until it has expired, even
//! if a more severe condition appears in the meantime.

use crate::config::Thresholds;
use crate::core::trend::{Prediction, TrendState};
use crate::observation::Observation;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Why an alert fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Critical,
    Warning,
    Emotion,
}

/// Alert urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
}

impl AlertKind {
    /// Priority attached to alerts of this kind.
    pub fn priority(self) -> AlertPriority {
        match self {
            AlertKind::Critical => AlertPriority::High,
            AlertKind::Warning | AlertKind::Emotion => AlertPriority::Medium,
        }
    }
}

/// A teacher-facing alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub session_id: String,
    pub student_id: String,
    pub message: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of evaluating one observation.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    /// An alert fired and the cooldown restarted
    Fired(Alert),
    /// A condition matched but the student is cooling down
    Suppressed(AlertKind),
    /// Nothing worth alerting on
    Quiet,
}

impl AlertOutcome {
    /// The alert, if one fired.
    pub fn into_alert(self) -> Option<Alert> {
        match self {
            AlertOutcome::Fired(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Per-student alert decision with cooldown.
#[derive(Debug, Clone)]
pub struct AlertDecider {
    thresholds: Thresholds,
    cooldown: Duration,
    last_alert_at: Option<DateTime<Utc>>,
}

impl AlertDecider {
    /// Create a decider with no alert history.
    pub fn new(thresholds: Thresholds, cooldown: std::time::Duration) -> Self {
        Self {
            thresholds,
            cooldown: Duration::from_std(cooldown).unwrap_or(Duration::MAX),
            last_alert_at: None,
        }
    }

    /// Decide whether `observation` warrants an alert at time `now`.
    ///
    /// The first matching condition wins: critical engagement, then a
    /// warning prediction, then a distressed emotion with low engagement.
    pub fn evaluate(
        &mut self,
        session_id: &str,
        student_id: &str,
        observation: &Observation,
        prediction: &Prediction,
        now: DateTime<Utc>,
    ) -> AlertOutcome {
        let Some((kind, message, action)) = self.classify(student_id, observation, prediction)
        else {
            return AlertOutcome::Quiet;
        };

        if self.cooling_down(now) {
            tracing::debug!(student_id, ?kind, "Alert suppressed by cooldown");
            return AlertOutcome::Suppressed(kind);
        }

        self.last_alert_at = Some(now);
        AlertOutcome::Fired(Alert {
            id: Uuid::new_v4(),
            kind,
            priority: kind.priority(),
            session_id: session_id.to_string(),
            student_id: student_id.to_string(),
            message,
            action: action.to_string(),
            timestamp: now,
        })
    }

    fn classify(
        &self,
        student_id: &str,
        observation: &Observation,
        prediction: &Prediction,
    ) -> Option<(AlertKind, String, &'static str)> {
        let engagement = observation.engagement_score;

        if engagement < self.thresholds.critical_engagement {
            return Some((
                AlertKind::Critical,
                format!(
                    "{student_id} shows very low engagement ({:.0}%)",
                    engagement * 100.0
                ),
                "Immediate intervention recommended",
            ));
        }

        if prediction.state == TrendState::Warning {
            if let Some(minutes) = prediction
                .time_to_critical_minutes
                .filter(|&m| m < self.thresholds.warning_minutes)
            {
                return Some((
                    AlertKind::Warning,
                    format!("{student_id} engagement declining. Critical in {minutes:.1} min"),
                    "Consider checking on student",
                ));
            }
        }

        if observation.emotion.is_distressed()
            && engagement < self.thresholds.emotion_alert_engagement
        {
            return Some((
                AlertKind::Emotion,
                format!(
                    "{student_id} appears {}. May need clarification",
                    observation.emotion
                ),
                "Pause and ask if anyone has questions",
            ));
        }

        None
    }

    fn cooling_down(&self, now: DateTime<Utc>) -> bool {
        self.last_alert_at
            .is_some_and(|last| now - last <= self.cooldown)
    }

    /// When the last alert fired, if ever.
    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }
}

/// Alert counts for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total_alerts: usize,
    pub by_type: BTreeMap<AlertKind, usize>,
    pub by_priority: BTreeMap<AlertPriority, usize>,
}

/// Bounded history of emitted alerts, shared by every student stream.
#[derive(Debug)]
pub struct AlertLog {
    capacity: usize,
    alerts: Mutex<VecDeque<Alert>>,
}

impl AlertLog {
    /// Create an empty log holding at most `capacity` alerts.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            alerts: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an alert, evicting the oldest one when full.
    pub fn push(&self, alert: Alert) {
        let mut alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        if alerts.len() == self.capacity {
            alerts.pop_front();
        }
        alerts.push_back(alert);
    }

    /// The newest `limit` alerts, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<Alert> {
        let alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = alerts.len().saturating_sub(limit);
        alerts.iter().skip(skip).cloned().collect()
    }

    /// Count the retained alerts by kind and by priority.
    pub fn summary(&self) -> AlertSummary {
        let alerts = self.alerts.lock().unwrap_or_else(PoisonError::into_inner);
        let mut summary = AlertSummary {
            total_alerts: alerts.len(),
            ..Default::default()
        };
        for alert in alerts.iter() {
            *summary.by_type.entry(alert.kind).or_insert(0) += 1;
            *summary.by_priority.entry(alert.priority).or_insert(0) += 1;
        }
        summary
    }

    /// Number of retained alerts.
    pub fn len(&self) -> usize {
        self.alerts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no alert has been logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
