//! Reporting views computed from a session's observation history.
//!
//! Everything here is a pure function of a `SessionHistory`. Per-minute views
//! bucket observations by calendar minute (UTC), and engagement values are
//! reported as percentages.

use crate::core::stats;
use crate::observation::Emotion;
use crate::session::SessionHistory;
use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Average engagement within one minute of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// Start of the calendar minute
    pub minute: DateTime<Utc>,
    /// Mean engagement across all students, in percent
    pub engagement: f64,
    /// Observations that fell in this minute
    pub samples: usize,
}

/// How one student compares with the rest of the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentComparison {
    pub student_id: String,
    /// Mean engagement, in percent
    pub average_engagement: f64,
    /// (1 - std) of engagement, in percent
    pub consistency: f64,
    /// Highest engagement, in percent
    pub peak_engagement: f64,
    /// Usable observations
    pub participation: usize,
    /// Share of happy or surprised frames, in percent
    pub positive_emotion_share: f64,
}

/// Mean engagement per student per calendar minute.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttentionHeatmap {
    /// Row labels
    pub students: Vec<String>,
    /// Column labels, start of each calendar minute
    pub minutes: Vec<DateTime<Utc>>,
    /// `cells[student][minute]`, in percent; `None` where the student had no samples
    pub cells: Vec<Vec<Option<f64>>>,
}

/// A caller-supplied stretch of the lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

/// How hard a topic appeared to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDifficulty {
    pub topic: String,
    /// (1 - mean engagement) in percent; `None` without samples
    pub difficulty: Option<f64>,
    pub samples: usize,
}

/// The standard set of views for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub session_id: String,
    pub emotion_distribution: BTreeMap<Emotion, f64>,
    pub engagement_timeline: Vec<TimelinePoint>,
    pub student_comparison: Vec<StudentComparison>,
    pub attention_heatmap: AttentionHeatmap,
}

impl AnalyticsReport {
    /// Compute every view for `history`.
    pub fn build(history: &SessionHistory) -> Self {
        Self {
            session_id: history.session_id.clone(),
            emotion_distribution: emotion_distribution(history),
            engagement_timeline: engagement_timeline(history),
            student_comparison: student_comparison(history),
            attention_heatmap: attention_heatmap(history),
        }
    }
}

fn percent(value: f64, decimals: i32) -> f64 {
    stats::round_to(value * 100.0, decimals)
}

/// Truncate a timestamp to the start of its calendar minute.
fn minute_of(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(Duration::minutes(1))
        .unwrap_or(timestamp)
}

/// Share of each detected emotion across all usable observations.
pub fn emotion_distribution(history: &SessionHistory) -> BTreeMap<Emotion, f64> {
    let mut counts: BTreeMap<Emotion, usize> = BTreeMap::new();
    for observation in history.all() {
        *counts.entry(observation.emotion).or_default() += 1;
    }

    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(emotion, count)| (emotion, percent(count as f64 / total as f64, 2)))
        .collect()
}

/// Class-wide mean engagement per minute.
pub fn engagement_timeline(history: &SessionHistory) -> Vec<TimelinePoint> {
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<f64>> = BTreeMap::new();
    for observation in history.all() {
        buckets
            .entry(minute_of(observation.timestamp))
            .or_default()
            .push(observation.engagement_score);
    }

    buckets
        .into_iter()
        .map(|(minute, scores)| TimelinePoint {
            minute,
            engagement: percent(stats::mean(&scores), 1),
            samples: scores.len(),
        })
        .collect()
}

/// Per-student engagement profile. Students without samples are left out.
pub fn student_comparison(history: &SessionHistory) -> Vec<StudentComparison> {
    history
        .students
        .iter()
        .filter(|(_, observations)| !observations.is_empty())
        .map(|(student_id, observations)| {
            let scores: Vec<f64> = observations.iter().map(|o| o.engagement_score).collect();
            let positive = observations
                .iter()
                .filter(|o| o.emotion.is_positive())
                .count();

            StudentComparison {
                student_id: student_id.clone(),
                average_engagement: percent(stats::mean(&scores), 1),
                consistency: percent(1.0 - stats::std_dev(&scores), 1),
                peak_engagement: percent(stats::max(&scores), 1),
                participation: observations.len(),
                positive_emotion_share: percent(positive as f64 / scores.len() as f64, 1),
            }
        })
        .collect()
}

/// Raw engagement per student per minute.
///
/// Cells average the observed engagement scores, not the tracker's smoothed
/// attention score, so a row agrees with the timeline for the same minute.
pub fn attention_heatmap(history: &SessionHistory) -> AttentionHeatmap {
    let minutes: Vec<DateTime<Utc>> = history
        .all()
        .map(|o| minute_of(o.timestamp))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut students = Vec::with_capacity(history.students.len());
    let mut cells = Vec::with_capacity(history.students.len());
    for (student_id, observations) in &history.students {
        let mut per_minute: BTreeMap<DateTime<Utc>, Vec<f64>> = BTreeMap::new();
        for observation in observations {
            per_minute
                .entry(minute_of(observation.timestamp))
                .or_default()
                .push(observation.engagement_score);
        }

        students.push(student_id.clone());
        cells.push(
            minutes
                .iter()
                .map(|minute| {
                    per_minute
                        .get(minute)
                        .map(|scores| percent(stats::mean(scores), 1))
                })
                .collect(),
        );
    }

    AttentionHeatmap {
        students,
        minutes,
        cells,
    }
}

/// Difficulty of each topic, judged by engagement during its time range.
pub fn topic_difficulty(history: &SessionHistory, topics: &[Topic]) -> Vec<TopicDifficulty> {
    topics
        .iter()
        .map(|topic| {
            let scores: Vec<f64> = history
                .all()
                .filter(|o| o.timestamp >= topic.start && o.timestamp < topic.end)
                .map(|o| o.engagement_score)
                .collect();

            TopicDifficulty {
                topic: topic.name.clone(),
                difficulty: (!scores.is_empty())
                    .then(|| percent(1.0 - stats::mean(&scores), 1)),
                samples: scores.len(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AttentionLevel, AttentionSnapshot, EnrichedObservation, TrendPredictor,
    };
    use crate::config::Thresholds;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn observation(emotion: Emotion, score: f64, at_secs: i64) -> EnrichedObservation {
        EnrichedObservation {
            emotion,
            confidence: 0.9,
            engagement_score: score,
            timestamp: start() + Duration::seconds(at_secs),
            prediction: TrendPredictor::new(10, Thresholds::default(), 2.0).predict(),
            // Smoothed attention differs from the raw score.
            attention: AttentionSnapshot {
                score: 0.5,
                level: AttentionLevel::Medium,
                stability: 1.0,
                distraction_count: 0,
                focus_duration_seconds: 0,
            },
            alert_fired: false,
        }
    }

    fn history() -> SessionHistory {
        SessionHistory {
            session_id: "S1".to_string(),
            students: vec![
                (
                    "alice".to_string(),
                    vec![
                        observation(Emotion::Happy, 0.9, 0),
                        observation(Emotion::Happy, 0.9, 30),
                        observation(Emotion::Neutral, 0.6, 70),
                    ],
                ),
                (
                    "bob".to_string(),
                    vec![observation(Emotion::Sad, 0.3, 10)],
                ),
                ("carol".to_string(), Vec::new()),
            ],
        }
    }

    #[test]
    fn test_emotion_distribution() {
        let distribution = emotion_distribution(&history());
        assert_eq!(distribution[&Emotion::Happy], 50.0);
        assert_eq!(distribution[&Emotion::Neutral], 25.0);
        assert_eq!(distribution[&Emotion::Sad], 25.0);
        assert!(!distribution.contains_key(&Emotion::Angry));
    }

    #[test]
    fn test_emotion_distribution_rounds_to_two_places() {
        let history = SessionHistory {
            session_id: "S1".to_string(),
            students: vec![(
                "alice".to_string(),
                vec![
                    observation(Emotion::Happy, 0.9, 0),
                    observation(Emotion::Sad, 0.3, 1),
                    observation(Emotion::Fear, 0.2, 2),
                ],
            )],
        };
        assert_eq!(emotion_distribution(&history)[&Emotion::Happy], 33.33);
    }

    #[test]
    fn test_timeline_buckets_by_minute() {
        let timeline = engagement_timeline(&history());
        assert_eq!(timeline.len(), 2);

        assert_eq!(timeline[0].minute, start());
        assert_eq!(timeline[0].samples, 3);
        assert_eq!(timeline[0].engagement, 70.0);

        assert_eq!(timeline[1].minute, start() + Duration::minutes(1));
        assert_eq!(timeline[1].engagement, 60.0);
    }

    #[test]
    fn test_timeline_uses_calendar_minutes() {
        // 09:00:50 and 09:01:10 are twenty seconds apart but in different minutes.
        let history = SessionHistory {
            session_id: "S1".to_string(),
            students: vec![(
                "alice".to_string(),
                vec![
                    observation(Emotion::Happy, 0.9, 50),
                    observation(Emotion::Neutral, 0.6, 70),
                ],
            )],
        };
        let timeline = engagement_timeline(&history);

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].minute, start());
        assert_eq!(timeline[0].engagement, 90.0);
        assert_eq!(timeline[1].minute, start() + Duration::minutes(1));
        assert_eq!(timeline[1].engagement, 60.0);
    }

    #[test]
    fn test_student_comparison_skips_silent_students() {
        let comparison = student_comparison(&history());
        assert_eq!(comparison.len(), 2);

        let alice = &comparison[0];
        assert_eq!(alice.student_id, "alice");
        assert_eq!(alice.average_engagement, 80.0);
        assert_eq!(alice.peak_engagement, 90.0);
        assert_eq!(alice.participation, 3);
        assert_eq!(alice.positive_emotion_share, 66.7);

        let bob = &comparison[1];
        assert_eq!(bob.consistency, 100.0);
        assert_eq!(bob.positive_emotion_share, 0.0);
    }

    #[test]
    fn test_attention_heatmap_shape() {
        let heatmap = attention_heatmap(&history());
        assert_eq!(heatmap.students, vec!["alice", "bob", "carol"]);
        assert_eq!(
            heatmap.minutes,
            vec![start(), start() + Duration::minutes(1)]
        );
        assert_eq!(heatmap.cells[0], vec![Some(90.0), Some(60.0)]);
        assert_eq!(heatmap.cells[1], vec![Some(30.0), None]);
        assert_eq!(heatmap.cells[2], vec![None, None]);
    }

    #[test]
    fn test_heatmap_matches_timeline_after_sudden_drop() {
        let history = SessionHistory {
            session_id: "S1".to_string(),
            students: vec![(
                "alice".to_string(),
                vec![
                    observation(Emotion::Happy, 0.9, 0),
                    observation(Emotion::Happy, 0.9, 2),
                    observation(Emotion::Happy, 0.9, 4),
                    observation(Emotion::Angry, 0.1, 62),
                ],
            )],
        };
        let heatmap = attention_heatmap(&history);
        let timeline = engagement_timeline(&history);

        assert_eq!(heatmap.cells[0][1], Some(10.0));
        assert_eq!(heatmap.cells[0][1], Some(timeline[1].engagement));
    }

    #[test]
    fn test_topic_difficulty() {
        let topics = vec![
            Topic {
                name: "intro".to_string(),
                start: start(),
                end: start() + Duration::seconds(60),
            },
            Topic {
                name: "later".to_string(),
                start: start() + Duration::minutes(10),
                end: start() + Duration::minutes(20),
            },
        ];
        let difficulty = topic_difficulty(&history(), &topics);

        assert_eq!(difficulty[0].samples, 3);
        assert_eq!(difficulty[0].difficulty, Some(30.0));
        assert_eq!(difficulty[1].difficulty, None);
    }

    #[test]
    fn test_empty_history() {
        let report = AnalyticsReport::build(&SessionHistory::default());
        assert!(report.emotion_distribution.is_empty());
        assert!(report.engagement_timeline.is_empty());
        assert!(report.student_comparison.is_empty());
        assert!(report.attention_heatmap.cells.is_empty());
    }
}
