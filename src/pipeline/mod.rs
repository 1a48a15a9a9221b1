//! Model pipeline: preprocessing followed by a random forest
//!
//! [`PipelineBuilder`] fixes the stages and their parameters; fitting yields a
//! [`FittedPipeline`] that owns imputation statistics, encoder vocabularies
//! and trees, so inference needs nothing else.

pub mod artifact;
pub mod features;
pub mod forest;
pub mod preprocess;

use serde::{Deserialize, Serialize};

pub use artifact::{ArtifactMetadata, ModelArtifact};
pub use features::{FeatureRow, CATEGORICAL_FEATURES, FEATURE_COLUMNS, LABEL_COLUMN, NUMERIC_FEATURES};
pub use forest::{ClassWeight, ForestParams, MaxFeatures, RandomForestClassifier};
pub use preprocess::Preprocessor;

use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    params: ForestParams,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fit both stages on labeled rows.
    pub fn fit(&self, rows: &[FeatureRow], labels: &[u8]) -> Result<FittedPipeline> {
        if rows.len() != labels.len() {
            return Err(Error::DataShape(format!(
                "{} feature rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let preprocessor = Preprocessor::fit(rows)?;
        let matrix: Vec<Vec<f64>> = rows.iter().map(|r| preprocessor.transform(r)).collect();
        tracing::debug!(
            rows = matrix.len(),
            width = preprocessor.output_width(),
            "Preprocessed training matrix"
        );

        let model = RandomForestClassifier::fit(&self.params, &matrix, labels)?;
        Ok(FittedPipeline { preprocessor, model })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    preprocessor: Preprocessor,
    model: RandomForestClassifier,
}

impl FittedPipeline {
    /// `P(HeartDisease = 1 | row)`
    pub fn predict_proba(&self, row: &FeatureRow) -> f64 {
        let x = self.preprocessor.transform(row);
        self.model.predict_proba(&x)
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn model(&self) -> &RandomForestClassifier {
        &self.model
    }
}
