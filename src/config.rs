//! Configuration for the engagement engine.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity of each student's trend window
    pub trend_window: usize,

    /// Capacity of each student's attention window
    pub attention_window: usize,

    /// Number of most recent samples the attention score is computed over
    pub attention_recent: usize,

    /// Assumed interval between two observations of one student
    #[serde(with = "duration_serde")]
    pub sampling_interval: Duration,

    /// Minimum time between two alerts for the same student
    #[serde(with = "duration_serde")]
    pub alert_cooldown: Duration,

    /// Number of alerts retained for the "recent alerts" view
    pub alert_history_capacity: usize,

    /// Capacity of the outbound alert channel
    pub alert_channel_capacity: usize,

    /// Classification and alerting thresholds
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trend_window: 10,
            attention_window: 30,
            attention_recent: 10,
            sampling_interval: Duration::from_secs(2),
            alert_cooldown: Duration::from_secs(30),
            alert_history_capacity: 100,
            alert_channel_capacity: 1024,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults
    /// when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("engagement-monitor")
            .join("config.json")
    }

    /// Sampling interval in seconds, used by the duration estimates.
    pub fn sampling_interval_secs(&self) -> f64 {
        self.sampling_interval.as_secs_f64()
    }
}

/// Thresholds used by trend classification, attention tracking and alerting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Engagement below this is critical
    pub critical_engagement: f64,
    /// Minutes-to-critical below which a declining student is a warning
    pub warning_minutes: f64,
    /// Absolute slope separating stable from improving/declining
    pub trend_slope: f64,
    /// Drop between consecutive samples counted as a distraction
    pub distraction_drop: f64,
    /// Engagement below which a sad/fearful student raises an alert
    pub emotion_alert_engagement: f64,
    /// Samples needed before a trend is fitted
    pub min_trend_samples: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_engagement: 0.3,
            warning_minutes: 5.0,
            trend_slope: 0.05,
            distraction_drop: 0.3,
            emotion_alert_engagement: 0.5,
            min_trend_samples: 3,
        }
    }
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
