//! ETL orchestrator: dataset source → sentinel normalization → repository

use std::sync::Arc;

use crate::dataset::DatasetLoader;
use crate::repository::HeartRepository;
use crate::Result;

pub struct HeartEtlService {
    loader: Arc<dyn DatasetLoader>,
    repo: Arc<dyn HeartRepository>,
}

impl HeartEtlService {
    pub fn new(loader: Arc<dyn DatasetLoader>, repo: Arc<dyn HeartRepository>) -> Self {
        Self { loader, repo }
    }

    /// Load, normalize and upsert the whole dataset in one batch.
    /// Returns the number of rows submitted. Failures surface unchanged.
    pub async fn run(&self) -> Result<usize> {
        let table = self.loader.load().await?;
        let mut records = table.records()?;
        for record in &mut records {
            record.normalize_sentinels();
        }

        tracing::info!(rows = records.len(), "Upserting dataset batch");
        self.repo.bulk_upsert(&records).await?;

        Ok(records.len())
    }
}
