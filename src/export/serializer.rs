//! Fitted-pipeline serialization

use crate::dataset::DatasetSchema;
use crate::error::{CarpriceError, Result};
use crate::optimizer::{Scoring, SearchResult};
use crate::pipeline::FittedPipeline;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Description of the stored model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Number of selected features
    pub best_k: usize,
    /// Mean cross-validated score of the stored pipeline
    pub cv_score: f64,
    pub scoring: Scoring,
    /// Encoded columns kept by the selector
    pub feature_names: Vec<String>,
    pub target_name: String,
    /// Column layout the pipeline was trained on; prediction derives features with it
    pub schema: DatasetSchema,
}

/// Persisted model file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    pub metadata: ArtifactMetadata,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    /// Magic bytes for carprice model files
    pub const MAGIC: [u8; 4] = [b'C', b'P', b'R', b'M'];
    /// Current format version
    pub const VERSION: u32 = 2;

    pub fn new(metadata: ArtifactMetadata, pipeline: FittedPipeline) -> Self {
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            pipeline,
        }
    }

    /// Wrap the winner of a completed search
    pub fn from_search(result: &SearchResult, schema: &DatasetSchema) -> Self {
        let metadata = ArtifactMetadata {
            best_k: result.best_k,
            cv_score: result.best_score,
            scoring: result.scoring,
            feature_names: result.best_pipeline.selected_feature_names(),
            target_name: schema.target_column.clone(),
            schema: schema.clone(),
        };
        Self::new(metadata, result.best_pipeline.clone())
    }

    fn check_header(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(CarpriceError::SerializationError(
                "not a carprice model file (bad magic bytes)".to_string(),
            ));
        }
        if self.format_version != Self::VERSION {
            return Err(CarpriceError::SerializationError(format!(
                "unsupported model format version {} (expected {})",
                self.format_version,
                Self::VERSION
            )));
        }
        Ok(())
    }
}

/// Write an artifact as gzip-compressed bincode, creating parent directories
pub fn save_model(path: impl AsRef<Path>, artifact: &ModelArtifact) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    bincode::serialize_into(&mut encoder, artifact)?;
    let mut writer = encoder.finish()?;
    writer.flush()?;

    info!(path = %path.display(), best_k = artifact.metadata.best_k, "Model saved");
    Ok(())
}

/// Read an artifact written by [`save_model`]
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelArtifact> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let decoder = GzDecoder::new(BufReader::new(file));

    let artifact: ModelArtifact = bincode::deserialize_from(decoder)?;
    artifact.check_header()?;

    info!(path = %path.display(), best_k = artifact.metadata.best_k, "Model loaded");
    Ok(artifact)
}
