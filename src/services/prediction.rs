//! Prediction service over a loaded model artifact

use std::path::Path;

use crate::models::{HeartRecord, Prediction};
use crate::pipeline::{ArtifactMetadata, FeatureRow, ModelArtifact};
use crate::Result;

/// Fixed decision threshold on `P(HeartDisease = 1)`.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// `true` iff `probability >= DECISION_THRESHOLD`.
pub fn decide(probability: f64) -> bool {
    probability >= DECISION_THRESHOLD
}

/// Scores records against an artifact loaded once at construction.
///
/// Holds no mutable state, so a single instance can be shared across
/// request handlers behind an `Arc`.
#[derive(Debug)]
pub struct PredictionService {
    artifact: ModelArtifact,
}

impl PredictionService {
    /// Load the artifact; a missing or corrupt file is a model load error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let artifact = ModelArtifact::load(path.as_ref())?;
        Ok(Self::from_artifact(artifact))
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    /// Score one record. Its label, if any, is ignored.
    pub fn predict(&self, record: &HeartRecord) -> Prediction {
        let row = FeatureRow::from(record);
        let probability = self.artifact.pipeline.predict_proba(&row);
        tracing::debug!(probability, "Scored record");

        Prediction {
            probability,
            has_disease: decide(probability),
        }
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.artifact.metadata
    }

    pub fn tree_count(&self) -> usize {
        self.artifact.pipeline.model().trees().len()
    }
}
