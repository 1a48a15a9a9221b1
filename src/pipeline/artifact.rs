//! Model artifact persistence
//!
//! File layout: one JSON header line (magic, format version, SHA-256 of the
//! body) followed by the JSON body. Loading verifies all three before
//! deserializing the pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{FittedPipeline, ForestParams, FEATURE_COLUMNS};
use crate::{Error, Result};

const MAGIC: &str = "heart-risk-model";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    magic: String,
    format_version: u32,
    sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
    pub positive_rate: f64,
    pub feature_columns: Vec<String>,
    pub params: ForestParams,
}

/// Fitted pipeline plus provenance. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    pub fn new(pipeline: FittedPipeline, training_rows: usize, positive_rate: f64) -> Self {
        Self {
            metadata: ArtifactMetadata {
                format_version: FORMAT_VERSION,
                trained_at: Utc::now(),
                training_rows,
                positive_rate,
                feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                params: pipeline.model().params().clone(),
            },
            pipeline,
        }
    }

    /// Write to `destination`, replacing any existing artifact.
    pub fn save(&self, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_vec(self)?;
        let header = ArtifactHeader {
            magic: MAGIC.to_string(),
            format_version: FORMAT_VERSION,
            sha256: hex::encode(Sha256::digest(&body)),
        };

        let mut bytes = serde_json::to_vec(&header)?;
        bytes.push(b'\n');
        bytes.extend_from_slice(&body);

        // Readers never observe a half-written file
        let staging = staging_path(destination);
        fs::write(&staging, &bytes)?;
        fs::rename(&staging, destination)?;

        tracing::info!(
            path = %destination.display(),
            bytes = bytes.len(),
            trees = self.pipeline.model().trees().len(),
            "Model artifact saved"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let load_err = |reason: String| Error::ModelLoad { path: path.to_path_buf(), reason };

        let bytes = fs::read(path).map_err(|e| load_err(e.to_string()))?;
        let split = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| load_err("missing artifact header".to_string()))?;
        let (header, body) = (&bytes[..split], &bytes[split + 1..]);

        let header: ArtifactHeader = serde_json::from_slice(header)
            .map_err(|e| load_err(format!("unreadable header: {}", e)))?;
        if header.magic != MAGIC {
            return Err(load_err("not a heart-risk model artifact".to_string()));
        }
        if header.format_version != FORMAT_VERSION {
            return Err(load_err(format!(
                "unsupported format version {} (expected {})",
                header.format_version, FORMAT_VERSION
            )));
        }
        if hex::encode(Sha256::digest(body)) != header.sha256 {
            return Err(load_err("checksum mismatch".to_string()));
        }

        let artifact: ModelArtifact = serde_json::from_slice(body)
            .map_err(|e| load_err(format!("unreadable body: {}", e)))?;

        tracing::info!(
            path = %path.display(),
            trained_at = %artifact.metadata.trained_at,
            trees = artifact.pipeline.model().trees().len(),
            "Model artifact loaded"
        );
        Ok(artifact)
    }
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}
