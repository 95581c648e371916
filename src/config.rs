//! Workflow configuration
//!
//! One caller-owned value describes a whole training run. Nothing in the
//! library reads global state; the binary builds a `WorkflowConfig` from
//! defaults, an optional JSON file and command-line overrides.

use crate::dataset::DatasetSchema;
use crate::error::{CarpriceError, Result};
use crate::optimizer::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    /// Destination of the compressed model artifact
    pub model_path: PathBuf,
    /// Destination of the newline-delimited metrics records
    pub metrics_path: PathBuf,
    pub schema: DatasetSchema,
    pub search: SearchConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            train_path: PathBuf::from("files/input/train_data.csv"),
            test_path: PathBuf::from("files/input/test_data.csv"),
            model_path: PathBuf::from("files/models/model.bin.gz"),
            metrics_path: PathBuf::from("files/output/metrics.json"),
            schema: DatasetSchema::default(),
            search: SearchConfig::default(),
        }
    }
}

impl WorkflowConfig {
    /// Load a JSON configuration; absent fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CarpriceError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            CarpriceError::ConfigError(format!("invalid config '{}': {}", path.display(), e))
        })?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema.target_column.trim().is_empty() {
            return Err(CarpriceError::ConfigError(
                "target_column must not be empty".to_string(),
            ));
        }
        if self
            .schema
            .categorical_features
            .contains(&self.schema.target_column)
        {
            return Err(CarpriceError::ConfigError(format!(
                "target column '{}' is also listed as categorical",
                self.schema.target_column
            )));
        }
        self.search.validate()
    }
}
