//! Training service: fit the pipeline on a labeled table and persist it

use std::path::{Path, PathBuf};

use crate::dataset::Table;
use crate::pipeline::{
    FeatureRow, ForestParams, ModelArtifact, PipelineBuilder, FEATURE_COLUMNS, LABEL_COLUMN,
};
use crate::{Error, Result};

/// Offline, single-writer trainer.
#[derive(Debug, Clone, Default)]
pub struct TrainingService {
    builder: PipelineBuilder,
}

impl TrainingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ForestParams) -> Self {
        Self { builder: PipelineBuilder::with_params(params) }
    }

    /// Fit a pipeline on `dataset` without touching the filesystem.
    ///
    /// Shape checks (label column, feature columns, fully populated 0/1
    /// labels) run before any fitting work.
    pub fn fit(&self, dataset: &Table) -> Result<ModelArtifact> {
        dataset.require_columns(&[LABEL_COLUMN])?;
        dataset.require_columns(&FEATURE_COLUMNS)?;

        let mut records = dataset.records()?;
        let mut labels = Vec::with_capacity(records.len());
        for (i, record) in records.iter_mut().enumerate() {
            let label = match record.heart_disease.take() {
                Some(0) => 0u8,
                Some(1) => 1u8,
                Some(other) => {
                    return Err(Error::DataShape(format!(
                        "row {}: {} must be 0 or 1, got {}",
                        i, LABEL_COLUMN, other
                    )))
                }
                None => {
                    return Err(Error::DataShape(format!(
                        "row {}: {} is required for training",
                        i, LABEL_COLUMN
                    )))
                }
            };
            labels.push(label);
            record.normalize_sentinels();
        }

        let rows: Vec<FeatureRow> = records.iter().map(FeatureRow::from).collect();
        let positives = labels.iter().filter(|&&l| l == 1).count();
        let positive_rate = if labels.is_empty() {
            0.0
        } else {
            positives as f64 / labels.len() as f64
        };

        tracing::info!(
            rows = rows.len(),
            positives,
            trees = self.builder.params().n_estimators,
            "Fitting heart-disease pipeline"
        );
        let pipeline = self.builder.fit(&rows, &labels)?;

        Ok(ModelArtifact::new(pipeline, rows.len(), positive_rate))
    }

    /// Fit on `dataset` and write the artifact to `destination`, replacing
    /// any existing one. Returns the destination path.
    pub fn fit_and_save(&self, dataset: &Table, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let destination = destination.as_ref();
        let artifact = self.fit(dataset)?;
        artifact.save(destination)?;
        Ok(destination.to_path_buf())
    }
}
