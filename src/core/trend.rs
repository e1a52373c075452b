//! Engagement trend prediction.
//!
//! A least-squares line is fitted over the student's recent engagement
//! window. The slope gives the trend direction, and extrapolating it down to
//! the critical threshold gives an estimate of how many minutes remain before
//! the student becomes critical.

use crate::config::Thresholds;
use crate::core::stats;
use crate::core::window::WindowBuffer;
use serde::{Deserialize, Serialize};

/// Risk classification of a student's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendState {
    InsufficientData,
    Normal,
    Warning,
    Critical,
}

/// Direction of the fitted engagement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Unknown,
    Improving,
    Stable,
    Declining,
}

/// Result of one trend update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub state: TrendState,
    pub trend: TrendDirection,
    /// Fill ratio of the window (0-1)
    pub confidence: f64,
    /// Engagement change per sample
    pub slope: f64,
    /// Mean of the last three samples
    pub current_engagement: f64,
    /// Estimated minutes until engagement reaches the critical threshold
    pub time_to_critical_minutes: Option<f64>,
}

impl Prediction {
    fn insufficient() -> Self {
        Self {
            state: TrendState::InsufficientData,
            trend: TrendDirection::Unknown,
            confidence: 0.0,
            slope: 0.0,
            current_engagement: 0.0,
            time_to_critical_minutes: None,
        }
    }
}

/// Descriptive statistics over the trend window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub current: f64,
    pub samples: usize,
}

/// Number of trailing samples averaged into `current_engagement`.
const CURRENT_SAMPLES: usize = 3;

/// Per-student trend predictor.
#[derive(Debug, Clone)]
pub struct TrendPredictor {
    window: WindowBuffer,
    thresholds: Thresholds,
    sampling_interval_secs: f64,
}

impl TrendPredictor {
    /// Create a predictor over a window of `capacity` samples.
    pub fn new(capacity: usize, thresholds: Thresholds, sampling_interval_secs: f64) -> Self {
        Self {
            window: WindowBuffer::new(capacity),
            thresholds,
            sampling_interval_secs,
        }
    }

    /// Push a new engagement score and recompute the prediction.
    pub fn update(&mut self, engagement_score: f64) -> Prediction {
        self.window.push(engagement_score);
        self.predict()
    }

    /// Compute the prediction for the current window without mutating it.
    pub fn predict(&self) -> Prediction {
        let samples = self.window.snapshot();
        if samples.len() < self.thresholds.min_trend_samples.max(1) {
            return Prediction::insufficient();
        }

        let slope = stats::linear_slope(&samples);
        let current_engagement = stats::mean(&self.window.recent(CURRENT_SAMPLES));

        let trend = if slope < -self.thresholds.trend_slope {
            TrendDirection::Declining
        } else if slope > self.thresholds.trend_slope {
            TrendDirection::Improving
        } else {
            TrendDirection::Stable
        };

        let critical = self.thresholds.critical_engagement;
        let time_to_critical_minutes = if trend == TrendDirection::Declining
            && current_engagement > critical
            && slope != 0.0
        {
            let samples_to_critical = (critical - current_engagement) / slope;
            Some((samples_to_critical * self.sampling_interval_secs / 60.0).abs())
        } else {
            None
        };

        let state = if current_engagement < critical {
            TrendState::Critical
        } else if trend == TrendDirection::Declining
            && time_to_critical_minutes.is_some_and(|m| m < self.thresholds.warning_minutes)
        {
            TrendState::Warning
        } else {
            TrendState::Normal
        };

        let confidence = (samples.len() as f64 / self.window.capacity() as f64).min(1.0);

        Prediction {
            state,
            trend,
            confidence,
            slope,
            current_engagement,
            time_to_critical_minutes,
        }
    }

    /// Statistics over the retained window, `None` before the first sample.
    pub fn stats(&self) -> Option<EngagementStats> {
        let samples = self.window.snapshot();
        let current = self.window.latest()?;
        Some(EngagementStats {
            mean: stats::mean(&samples),
            std: stats::std_dev(&samples),
            min: stats::min(&samples),
            max: stats::max(&samples),
            current,
            samples: samples.len(),
        })
    }

    /// The underlying engagement window.
    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }
}
