//! Integration tests for the frame pipeline

use engagement_monitor::{
    Classification, Classifier, Config, Emotion, FramePipeline, FrameStatus, SessionRegistry,
};
use std::sync::Arc;

/// Reads the first byte as a label: 0 = no face, 1 = happy, anything else = sad.
struct ByteClassifier;

impl Classifier for ByteClassifier {
    fn classify(&self, frame: &[u8]) -> Classification {
        match frame.first() {
            None | Some(0) => Classification::NoFace,
            Some(1) => Classification::face(Emotion::Happy, 0.9),
            Some(_) => Classification::face(Emotion::Sad, 0.7),
        }
    }
}

fn pipeline() -> FramePipeline {
    let registry = Arc::new(SessionRegistry::new(Config::default()));
    registry.create_session("S1", "T1", "Math").unwrap();
    FramePipeline::new(registry, Arc::new(ByteClassifier))
}

#[tokio::test]
async fn test_face_frame_is_ingested() {
    let pipeline = pipeline();
    let result = pipeline.process_frame("S1", "alice", vec![1]).await.unwrap();

    assert_eq!(result.status, FrameStatus::Success);
    assert_eq!(result.emotion, Emotion::Happy);
    assert_eq!(result.engagement_score, 0.95);
    assert_eq!(result.focus_score, 95);
    assert!(result.alert.is_none());

    let history = pipeline.registry().student_history("S1", "alice").unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_empty_frame_is_no_face() {
    let pipeline = pipeline();
    let result = pipeline.process_frame("S1", "alice", Vec::new()).await.unwrap();

    assert_eq!(result.status, FrameStatus::NoFace);
    assert_eq!(result.emotion, Emotion::NoFace);
    assert!(pipeline
        .registry()
        .student_history("S1", "alice")
        .unwrap()
        .is_empty());
    assert_eq!(pipeline.registry().session("S1").unwrap().total_observations, 1);
}

#[tokio::test]
async fn test_distressed_frame_alerts() {
    let pipeline = pipeline();
    let result = pipeline.process_frame("S1", "bob", vec![7]).await.unwrap();

    assert_eq!(result.emotion, Emotion::Sad);
    assert!(result.alert.is_some());
}

#[tokio::test]
async fn test_unknown_session_propagates() {
    let pipeline = pipeline();
    let err = pipeline
        .process_frame("missing", "alice", vec![1])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_frames() {
    let pipeline = pipeline();
    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                let student = format!("student-{}", i % 4);
                pipeline.process_frame("S1", &student, vec![1]).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let session = pipeline.registry().session("S1").unwrap();
    assert_eq!(session.total_observations, 16);
    assert_eq!(session.student_ids.len(), 4);
}
