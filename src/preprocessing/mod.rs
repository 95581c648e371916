//! Data preprocessing module
//!
//! Turns the mixed-type feature frame into a dense numeric matrix:
//! - One-hot encoding of categorical columns (unknown categories encode as zeros)
//! - Min-max scaling of numerical columns
//! - Column routing with passthrough of unlisted columns
//! - Univariate K-best feature selection

mod encoder;
mod scaler;
pub mod column_transformer;
pub mod feature_selection;

pub use encoder::{OneHotEncoder, HandleUnknown};
pub use scaler::MinMaxScaler;
pub use column_transformer::{ColumnTransformer, Remainder};
pub use feature_selection::FeatureSelector;

use crate::error::{CarpriceError, Result};
use polars::prelude::*;

/// Fetch a column and cast it to `Float64`.
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Series> {
    let column = df
        .column(name)
        .map_err(|_| CarpriceError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series)
}

/// Fetch a column and cast it to `String` so every dtype compares as text.
pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Series> {
    let column = df
        .column(name)
        .map_err(|_| CarpriceError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series)
}
