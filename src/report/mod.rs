//! Goodness-of-fit reporting
//!
//! Applies a fitted pipeline to named partitions and writes one JSON record
//! per partition, newline-delimited.

use crate::error::Result;
use crate::pipeline::FittedPipeline;
use crate::training::RegressionMetrics;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// One metrics line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub dataset: String,
    pub r2: f64,
    pub mse: f64,
    /// Mean absolute deviation of the predictions
    pub mad: f64,
}

impl MetricsRecord {
    pub fn new(dataset: impl Into<String>, metrics: &RegressionMetrics) -> Self {
        Self {
            record_type: "metrics".to_string(),
            dataset: dataset.into(),
            r2: metrics.r2,
            mse: metrics.mse,
            mad: metrics.mae,
        }
    }
}

/// Score the pipeline on every `(name, features, target)` partition
pub fn evaluate(
    pipeline: &FittedPipeline,
    partitions: &[(&str, &DataFrame, &Array1<f64>)],
) -> Result<Vec<MetricsRecord>> {
    partitions
        .iter()
        .map(|(name, x, y)| {
            let y_pred = pipeline.predict(x)?;
            let metrics = RegressionMetrics::compute(y, &y_pred)?;
            info!(
                dataset = %name,
                r2 = metrics.r2,
                mse = metrics.mse,
                mad = metrics.mae,
                "Evaluated partition"
            );
            Ok(MetricsRecord::new(*name, &metrics))
        })
        .collect()
}

/// Write records as newline-delimited JSON, creating parent directories
pub fn write_metrics(path: impl AsRef<Path>, records: &[MetricsRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
