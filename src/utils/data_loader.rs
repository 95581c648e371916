//! Data loading utilities

use crate::error::{CarpriceError, Result};
use flate2::read::MultiGzDecoder;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Data loader for the supported table formats
pub struct DataLoader {
    /// Rows used to infer column types
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(100),
        }
    }

    fn csv_options(&self) -> CsvReadOptions {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let df = self.csv_options().into_reader_with_file_handle(file).finish()?;
        Ok(df)
    }

    /// Load a gzip-compressed CSV file
    pub fn load_csv_gz(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        let mut bytes = Vec::new();
        MultiGzDecoder::new(BufReader::new(file))
            .read_to_end(&mut bytes)
            .map_err(|e| CarpriceError::DataError(format!("gzip decode failed: {}", e)))?;

        let df = self
            .csv_options()
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let lower = path.to_string_lossy().to_lowercase();

        let df = if lower.ends_with(".gz") {
            self.load_csv_gz(path)?
        } else if lower.ends_with(".zip") {
            return Err(CarpriceError::DataError(format!(
                "zip archives are not supported, extract '{}' first",
                path.display()
            )));
        } else {
            // Anything else is read as CSV
            self.load_csv(path)?
        };

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded table"
        );
        Ok(df)
    }
}

/// Data saver
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV, creating parent directories
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }
}
