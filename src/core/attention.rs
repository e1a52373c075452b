//! Attention stability tracking.
//!
//! Each student keeps a rolling window of engagement samples (30 by default,
//! roughly one minute of frames). The attention score is the mean of the most
//! recent samples and stability is one minus their standard deviation. A drop
//! between two consecutive samples larger than the distraction threshold is
//! recorded as a distraction event for the lifetime of the session.

use crate::config::Config;
use crate::core::stats;
use crate::core::window::WindowBuffer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse attention level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionLevel {
    Low,
    Medium,
    High,
}

impl AttentionLevel {
    /// Bucket an attention score into a level.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            AttentionLevel::High
        } else if score > 0.5 {
            AttentionLevel::Medium
        } else {
            AttentionLevel::Low
        }
    }
}

/// A sudden drop in engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractionEvent {
    pub timestamp: DateTime<Utc>,
    pub drop_amount: f64,
}

/// Attention state after one update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionSnapshot {
    pub score: f64,
    pub level: AttentionLevel,
    /// One minus the standard deviation of recent samples. Not clamped: very
    /// volatile input can make this negative.
    pub stability: f64,
    /// Distraction events recorded so far in the session
    pub distraction_count: usize,
    pub focus_duration_seconds: u64,
}

/// End-of-session attention summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttentionSummary {
    pub average_attention: f64,
    pub peak_attention: f64,
    pub lowest_attention: f64,
    pub total_distractions: usize,
    pub samples_analyzed: usize,
}

/// Samples required before the score is averaged.
const MIN_SAMPLES: usize = 3;

/// Stability reported before enough samples exist.
const NEUTRAL_STABILITY: f64 = 0.5;

/// Per-student attention tracker.
#[derive(Debug, Clone)]
pub struct AttentionTracker {
    window: WindowBuffer,
    recent: usize,
    distraction_drop: f64,
    sampling_interval_secs: f64,
    distractions: Vec<DistractionEvent>,
}

impl AttentionTracker {
    /// Create a tracker sized from the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            window: WindowBuffer::new(config.attention_window),
            recent: config.attention_recent.max(2),
            distraction_drop: config.thresholds.distraction_drop,
            sampling_interval_secs: config.sampling_interval_secs(),
            distractions: Vec::new(),
        }
    }

    /// Record an engagement sample taken at `timestamp`.
    pub fn update(&mut self, engagement_score: f64, timestamp: DateTime<Utc>) -> AttentionSnapshot {
        self.window.push(engagement_score);
        let recent = self.window.recent(self.recent);

        let (score, stability) = if self.window.len() < MIN_SAMPLES {
            (engagement_score, NEUTRAL_STABILITY)
        } else {
            (stats::mean(&recent), 1.0 - stats::std_dev(&recent))
        };

        if let [.., previous, current] = recent.as_slice() {
            let drop_amount = previous - current;
            if drop_amount > self.distraction_drop {
                tracing::debug!(drop_amount, "Distraction detected");
                self.distractions.push(DistractionEvent {
                    timestamp,
                    drop_amount,
                });
            }
        }

        AttentionSnapshot {
            score,
            level: AttentionLevel::from_score(score),
            stability,
            distraction_count: self.distractions.len(),
            focus_duration_seconds: (self.window.len() as f64 * self.sampling_interval_secs)
                .round() as u64,
        }
    }

    /// Summary over the retained window, `None` before the first sample.
    pub fn summary(&self) -> Option<AttentionSummary> {
        if self.window.is_empty() {
            return None;
        }

        let samples = self.window.snapshot();
        Some(AttentionSummary {
            average_attention: stats::mean(&samples),
            peak_attention: stats::max(&samples),
            lowest_attention: stats::min(&samples),
            total_distractions: self.distractions.len(),
            samples_analyzed: samples.len(),
        })
    }

    /// Every distraction recorded so far, oldest first.
    pub fn distractions(&self) -> &[DistractionEvent] {
        &self.distractions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> AttentionTracker {
        AttentionTracker::new(&Config::default())
    }

    fn feed(tracker: &mut AttentionTracker, scores: &[f64]) -> Option<AttentionSnapshot> {
        let mut last = None;
        for &score in scores {
            last = Some(tracker.update(score, Utc::now()));
        }
        last
    }

    #[test]
    fn test_large_drop_is_a_distraction() {
        let mut t = tracker();
        let snapshot = feed(&mut t, &[0.9, 0.5]).unwrap();
        assert_eq!(snapshot.distraction_count, 1);
        assert_eq!(t.distractions().len(), 1);
        assert!((t.distractions()[0].drop_amount - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_small_drop_is_not_a_distraction() {
        let mut t = tracker();
        let snapshot = feed(&mut t, &[0.9, 0.7]).unwrap();
        assert_eq!(snapshot.distraction_count, 0);
    }

    #[test]
    fn test_distraction_count_is_cumulative() {
        let mut t = tracker();
        feed(&mut t, &[0.9, 0.5, 0.9, 0.4, 0.45]);
        assert_eq!(t.distractions().len(), 2);

        // Counts survive eviction from the window.
        let snapshot = feed(&mut t, &[0.6; 40]).unwrap();
        assert_eq!(snapshot.distraction_count, 2);
    }

    #[test]
    fn test_neutral_defaults_before_three_samples() {
        let mut t = tracker();
        let snapshot = feed(&mut t, &[0.85]).unwrap();
        assert_eq!(snapshot.score, 0.85);
        assert_eq!(snapshot.stability, 0.5);
        assert_eq!(snapshot.level, AttentionLevel::High);
        assert_eq!(snapshot.focus_duration_seconds, 2);
    }

    #[test]
    fn test_score_uses_recent_samples() {
        let mut t = tracker();
        // Twenty low samples followed by ten high ones: only the last ten count.
        let mut scores = vec![0.1; 20];
        scores.extend([0.7; 10]);
        let snapshot = feed(&mut t, &scores).unwrap();

        assert!((snapshot.score - 0.7).abs() < 1e-9);
        assert!((snapshot.stability - 1.0).abs() < 1e-9);
        assert_eq!(snapshot.level, AttentionLevel::Medium);
        assert_eq!(snapshot.focus_duration_seconds, 60);
    }

    #[test]
    fn test_stability_is_not_clamped() {
        let mut t = tracker();
        let mut scores = Vec::new();
        for _ in 0..5 {
            scores.extend([0.0, 1.0]);
        }
        let snapshot = feed(&mut t, &scores).unwrap();
        assert!((snapshot.stability - 0.5).abs() < 1e-9);

        // Scores outside [0, 1] push stability below zero.
        let mut wide = AttentionTracker {
            window: WindowBuffer::new(30),
            recent: 10,
            distraction_drop: 0.3,
            sampling_interval_secs: 2.0,
            distractions: Vec::new(),
        };
        let snapshot = feed(&mut wide, &[-2.0, 2.0, -2.0, 2.0]).unwrap();
        assert!(snapshot.stability < 0.0);
    }

    #[test]
    fn test_levels() {
        assert_eq!(AttentionLevel::from_score(0.81), AttentionLevel::High);
        assert_eq!(AttentionLevel::from_score(0.8), AttentionLevel::Medium);
        assert_eq!(AttentionLevel::from_score(0.5), AttentionLevel::Low);
    }

    #[test]
    fn test_summary() {
        let mut t = tracker();
        assert!(t.summary().is_none());

        feed(&mut t, &[0.9, 0.5, 0.7]);
        let summary = t.summary().unwrap();
        assert!((summary.average_attention - 0.7).abs() < 1e-9);
        assert_eq!(summary.peak_attention, 0.9);
        assert_eq!(summary.lowest_attention, 0.5);
        assert_eq!(summary.total_distractions, 1);
        assert_eq!(summary.samples_analyzed, 3);
    }
}
