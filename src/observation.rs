//! Observation types produced by the external emotion classifier.
//!
//! One observation is one classified camera frame for one student. The
//! student identity travels alongside the observation as the ingest key.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emotion label reported by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Surprise,
    Neutral,
    Sad,
    Fear,
    Angry,
    Disgust,
    /// No face was found in the frame
    #[serde(rename = "No Face")]
    NoFace,
}

impl Emotion {
    /// All labels the classifier can produce for a detected face.
    pub const DETECTED: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Surprise,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Fear,
        Emotion::Angry,
        Emotion::Disgust,
    ];

    /// Engagement weight associated with a detected emotion.
    pub fn engagement_weight(self) -> f64 {
        match self {
            Emotion::Happy => 0.95,
            Emotion::Surprise => 0.85,
            Emotion::Neutral => 0.60,
            Emotion::Sad => 0.30,
            Emotion::Fear => 0.20,
            Emotion::Angry | Emotion::Disgust => 0.10,
            Emotion::NoFace => 0.0,
        }
    }

    /// Parse a classifier label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "happy" => Some(Emotion::Happy),
            "surprise" => Some(Emotion::Surprise),
            "neutral" => Some(Emotion::Neutral),
            "sad" => Some(Emotion::Sad),
            "fear" => Some(Emotion::Fear),
            "angry" => Some(Emotion::Angry),
            "disgust" => Some(Emotion::Disgust),
            "no face" | "no_face" => Some(Emotion::NoFace),
            _ => None,
        }
    }

    /// Sad and fearful students may need clarification.
    pub fn is_distressed(self) -> bool {
        matches!(self, Emotion::Sad | Emotion::Fear)
    }

    /// Emotions counted as positive in the student comparison view.
    pub fn is_positive(self) -> bool {
        matches!(self, Emotion::Happy | Emotion::Surprise)
    }

    /// Lowercase label, or `No Face`.
    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Fear => "fear",
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::NoFace => "No Face",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single classified frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Detected emotion
    pub emotion: Emotion,
    /// Classifier confidence in the label (0-1)
    pub confidence: f64,
    /// Engagement proxy derived from the emotion (0-1)
    pub engagement_score: f64,
    /// When the frame was captured
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// Create an observation. Call `validate` before ingesting it.
    pub fn new(
        emotion: Emotion,
        confidence: f64,
        engagement_score: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            emotion,
            confidence,
            engagement_score,
            timestamp,
        }
    }

    /// An observation for a frame in which no face was detected.
    pub fn no_face(timestamp: DateTime<Utc>) -> Self {
        Self::new(Emotion::NoFace, 0.0, 0.0, timestamp)
    }

    /// Whether this observation carries no usable sample.
    pub fn is_no_face(&self) -> bool {
        self.emotion == Emotion::NoFace
    }

    /// Reject observations with out-of-range or non-finite scores.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_unit("confidence", self.confidence)?;
        check_unit("engagement_score", self.engagement_score)
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidInput { field, value })
    }
}

/// Result of classifying one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// A face was found and labelled
    Face {
        emotion: Emotion,
        confidence: f64,
        engagement_score: f64,
    },
    /// No face was found, or the frame could not be decoded
    NoFace,
}

impl Classification {
    /// Build a face classification, deriving engagement from the emotion.
    pub fn face(emotion: Emotion, confidence: f64) -> Self {
        Classification::Face {
            emotion,
            confidence,
            engagement_score: emotion.engagement_weight(),
        }
    }

    /// Stamp the classification into an observation.
    pub fn into_observation(self, timestamp: DateTime<Utc>) -> Observation {
        match self {
            Classification::Face {
                emotion,
                confidence,
                engagement_score,
            } => Observation::new(emotion, confidence, engagement_score, timestamp),
            Classification::NoFace => Observation::no_face(timestamp),
        }
    }
}
