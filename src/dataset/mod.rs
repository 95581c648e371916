//! Feature derivation for the used-vehicle tables
//!
//! Turns a raw listing frame into the feature frame and the target vector:
//! `Age` replaces the manufacture year, the vehicle name is dropped and
//! incomplete rows are discarded. Prediction inputs go through
//! [`inference_frame`] instead, which keeps every row.

use crate::error::{CarpriceError, Result};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Column layout of the input tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    /// Identifying column dropped before modelling
    pub name_column: String,
    /// Manufacture year, replaced by the age column
    pub year_column: String,
    pub target_column: String,
    /// Year the age is measured from
    pub reference_year: i32,
    pub age_column: String,
    /// Columns one-hot encoded; every other feature is numerical
    pub categorical_features: Vec<String>,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            name_column: "Car_Name".to_string(),
            year_column: "Year".to_string(),
            target_column: "Present_Price".to_string(),
            reference_year: 2021,
            age_column: "Age".to_string(),
            categorical_features: ["Fuel_Type", "Selling_type", "Transmission", "Owner"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Derive the feature frame and target vector from a raw table
///
/// Rows with a null in any column are discarded before the target is split off.
pub fn derive_features(df: &DataFrame, schema: &DatasetSchema) -> Result<(DataFrame, Array1<f64>)> {
    if df.column(&schema.name_column).is_err() {
        return Err(CarpriceError::FeatureNotFound(schema.name_column.clone()));
    }
    let derived = with_age(df, schema)?.drop(&schema.name_column)?;

    let before = derived.height();
    let mut features = drop_incomplete_rows(&derived)?;
    debug!(dropped = before - features.height(), rows = features.height(), "Derived features");

    let target = features
        .column(&schema.target_column)
        .map_err(|_| CarpriceError::FeatureNotFound(schema.target_column.clone()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let y: Array1<f64> = target.f64()?.into_no_null_iter().collect();

    features = features.drop(&schema.target_column)?;
    Ok((features, y))
}

/// Build the frame a fitted pipeline reads, keeping every input row
///
/// Only `columns` are kept, so the target and unused columns may be absent
/// or null. A null in one of `columns` is a `ValidationError` naming the row.
pub fn inference_frame(
    df: &DataFrame,
    schema: &DatasetSchema,
    columns: &[String],
) -> Result<DataFrame> {
    let derived = with_age(df, schema)?;

    for name in columns {
        let column = derived
            .column(name)
            .map_err(|_| CarpriceError::FeatureNotFound(name.clone()))?;
        if column.null_count() > 0 {
            let row = column
                .as_materialized_series()
                .is_null()
                .into_iter()
                .position(|v| v == Some(true))
                .unwrap_or_default();
            return Err(CarpriceError::ValidationError(format!(
                "null value in column '{}' at row {}",
                name, row
            )));
        }
    }

    Ok(derived.select(columns.iter().map(|s| s.as_str()))?)
}

/// Replace the year column with the age column
fn with_age(df: &DataFrame, schema: &DatasetSchema) -> Result<DataFrame> {
    let year = df
        .column(&schema.year_column)
        .map_err(|_| CarpriceError::FeatureNotFound(schema.year_column.clone()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let reference = schema.reference_year as f64;
    let age: Float64Chunked = year
        .f64()?
        .apply_values(|y| reference - y)
        .with_name(schema.age_column.as_str().into());

    let mut out = df.clone();
    out.with_column(age.into_series())?;
    Ok(out.drop(&schema.year_column)?)
}

/// Numerical feature names: every column not listed as categorical, in frame order
pub fn numerical_features(df: &DataFrame, schema: &DatasetSchema) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .filter(|name| !schema.categorical_features.contains(name) && name != &schema.target_column)
        .collect()
}

/// Categorical feature names present in the frame
pub fn categorical_features(df: &DataFrame, schema: &DatasetSchema) -> Vec<String> {
    schema
        .categorical_features
        .iter()
        .filter(|name| df.column(name).is_ok())
        .cloned()
        .collect()
}

fn drop_incomplete_rows(df: &DataFrame) -> Result<DataFrame> {
    let mut mask = BooleanChunked::full("mask".into(), true, df.height());
    for column in df.get_columns() {
        mask = &mask & &column.as_materialized_series().is_not_null();
    }
    Ok(df.filter(&mask)?)
}
