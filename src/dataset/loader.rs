//! CSV loaders: local file and HTTP download with on-disk cache

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DatasetLoader, Table};
use crate::{Error, Result};

/// Reads the dataset from a local CSV file.
#[derive(Debug, Clone)]
pub struct CsvFileLoader {
    path: PathBuf,
}

impl CsvFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DatasetLoader for CsvFileLoader {
    async fn load(&self) -> Result<Table> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::Dataset(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let table = Table::from_csv_reader(bytes.as_slice())?;

        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            "Dataset loaded from file"
        );
        Ok(table)
    }
}

/// Downloads the dataset CSV once and reuses the cached copy afterwards.
#[derive(Debug, Clone)]
pub struct HttpCsvLoader {
    url: String,
    cache_path: PathBuf,
    client: reqwest::Client,
}

impl HttpCsvLoader {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            cache_path: cache_path.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn download(&self) -> Result<Vec<u8>> {
        tracing::info!(url = %self.url, "Downloading dataset");
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?.to_vec();

        if let Some(parent) = self.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.cache_path, &bytes).await?;
        tracing::debug!(path = %self.cache_path.display(), bytes = bytes.len(), "Dataset cached");

        Ok(bytes)
    }
}

#[async_trait]
impl DatasetLoader for HttpCsvLoader {
    async fn load(&self) -> Result<Table> {
        let cached = match tokio::fs::read(&self.cache_path).await {
            Ok(bytes) if !bytes.is_empty() => {
                tracing::info!(path = %self.cache_path.display(), "Using cached dataset");
                Some(bytes)
            }
            _ => None,
        };

        let bytes = match cached {
            Some(bytes) => bytes,
            None => self.download().await?,
        };

        let table = Table::from_csv_reader(bytes.as_slice())?;
        tracing::info!(rows = table.len(), "Dataset loaded");
        Ok(table)
    }
}
