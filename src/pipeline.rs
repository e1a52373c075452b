//! Frame pipeline: classify a raw frame off the async runtime, then ingest it.

use crate::core::FrameResult;
use crate::error::EngineError;
use crate::observation::Classification;
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Turns one encoded frame into a classification.
///
/// Implementations are CPU-bound and run on the blocking thread pool. A frame
/// without a face, or one that cannot be decoded, should yield
/// `Classification::NoFace`.
pub trait Classifier: Send + Sync {
    fn classify(&self, frame: &[u8]) -> Classification;
}

/// Connects a classifier to the registry.
#[derive(Clone)]
pub struct FramePipeline {
    registry: Arc<SessionRegistry>,
    classifier: Arc<dyn Classifier>,
}

impl FramePipeline {
    /// Create a pipeline feeding `registry`.
    pub fn new(registry: Arc<SessionRegistry>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            registry,
            classifier,
        }
    }

    /// The registry frames are ingested into.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Classify `frame` and ingest the result for `student_id`.
    ///
    /// The observation is stamped with the registry's clock once
    /// classification finishes.
    pub async fn process_frame(
        &self,
        session_id: &str,
        student_id: &str,
        frame: Vec<u8>,
    ) -> Result<FrameResult, EngineError> {
        let classifier = Arc::clone(&self.classifier);
        let classification = tokio::task::spawn_blocking(move || classifier.classify(&frame))
            .await
            .map_err(|e| {
                tracing::error!(session_id, student_id, "Classifier task failed: {}", e);
                EngineError::Classifier(e.to_string())
            })?;

        let observation = classification.into_observation(self.registry.clock().now());
        self.registry.ingest(session_id, student_id, observation)
    }
}
