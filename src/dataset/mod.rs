//! Dataset sources
//!
//! The ETL and training paths only depend on [`DatasetLoader`]; where the
//! table comes from is an adapter concern.

pub mod loader;
pub mod table;


use std::sync::Arc;

use async_trait::async_trait;

pub use loader::{CsvFileLoader, HttpCsvLoader};
pub use table::Table;

use crate::config::Config;
use crate::Result;

/// Capability: produce the raw heart dataset as a table.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    async fn load(&self) -> Result<Table>;
}

/// Pick the loader the configuration asks for: HTTP download when
/// `DATASET_URL` is set, otherwise the local file.
pub fn loader_from_config(config: &Config) -> Arc<dyn DatasetLoader> {
    match &config.dataset_url {
        Some(url) => Arc::new(HttpCsvLoader::new(url.clone(), config.dataset_path.clone())),
        None => Arc::new(CsvFileLoader::new(config.dataset_path.clone())),
    }
}
