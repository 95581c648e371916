//! Feature scaling

use crate::error::{CarpriceError, Result};
use super::numeric_column;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for a fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    column: String,
    min: f64,
    scale: f64, // training range, 1.0 for constant columns
}

/// Min-Max scaler: (x - min) / (max - min), mapped into `feature_range`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    feature_range: (f64, f64),
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    /// Create a new scaler targeting [0, 1]
    pub fn new() -> Self {
        Self {
            feature_range: (0.0, 1.0),
            params: Vec::new(),
            is_fitted: false,
        }
    }

    /// Set the output range
    pub fn with_feature_range(mut self, low: f64, high: f64) -> Result<Self> {
        if !(low < high) {
            return Err(CarpriceError::InvalidParameter {
                name: "feature_range".to_string(),
                value: format!("({}, {})", low, high),
                reason: "lower bound must be below upper bound".to_string(),
            });
        }
        self.feature_range = (low, high);
        Ok(self)
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut params = Vec::with_capacity(columns.len());
        for col_name in columns {
            let series = numeric_column(df, col_name)?;
            let ca = series.f64()?;

            let min = ca.min().unwrap_or(0.0);
            let max = ca.max().unwrap_or(1.0);
            let range = max - min;
            params.push(ScalerParams {
                column: col_name.to_string(),
                min,
                scale: if range == 0.0 { 1.0 } else { range },
            });
        }

        self.params = params;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns into a dense block, in fit order
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CarpriceError::ModelNotFitted);
        }

        let (low, high) = self.feature_range;
        let width = high - low;
        let mut out = Array2::zeros((df.height(), self.params.len()));

        for (col_idx, params) in self.params.iter().enumerate() {
            let series = numeric_column(df, &params.column)?;
            let ca = series.f64()?;

            for (row, value) in ca.into_iter().enumerate() {
                let v = value.ok_or_else(|| {
                    CarpriceError::ValidationError(format!(
                        "null value in numeric column '{}' at row {}",
                        params.column, row
                    ))
                })?;
                out[[row, col_idx]] = (v - params.min) / params.scale * width + low;
            }
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Column names in output order
    pub fn feature_names_out(&self) -> Vec<String> {
        self.params.iter().map(|p| p.column.clone()).collect()
    }

    /// Learned (min, max) of a column
    pub fn data_range(&self, column: &str) -> Option<(f64, f64)> {
        self.params
            .iter()
            .find(|p| p.column == column)
            .map(|p| (p.min, p.min + p.scale))
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minmax_scaler() {
        let df = df!("a" => &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let mut scaler = MinMaxScaler::new();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();

        let col = result.column(0);
        assert!((col[0] - 0.0).abs() < 1e-10);
        assert!((col[2] - 0.5).abs() < 1e-10);
        assert!((col[4] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_integer_column() {
        let df = df!("kms" => &[1000i64, 5000, 3000]).unwrap();

        let mut scaler = MinMaxScaler::new();
        let result = scaler.fit_transform(&df, &["kms"]).unwrap();
        assert!((result[[2, 0]] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_maps_to_lower_bound() {
        let df = df!("c" => &[7.0, 7.0, 7.0]).unwrap();

        let mut scaler = MinMaxScaler::new();
        let result = scaler.fit_transform(&df, &["c"]).unwrap();
        assert!(result.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_uses_training_range_only() {
        let train = df!("a" => &[0.0, 10.0]).unwrap();
        let test = df!("a" => &[20.0, -10.0]).unwrap();

        let mut scaler = MinMaxScaler::new();
        scaler.fit(&train, &["a"]).unwrap();
        let result = scaler.transform(&test).unwrap();

        // Values outside the training range are not clipped
        assert!((result[[0, 0]] - 2.0).abs() < 1e-10);
        assert!((result[[1, 0]] + 1.0).abs() < 1e-10);
        assert_eq!(scaler.data_range("a"), Some((0.0, 10.0)));
    }

    #[test]
    fn test_custom_feature_range() {
        let df = df!("a" => &[0.0, 5.0, 10.0]).unwrap();

        let mut scaler = MinMaxScaler::new().with_feature_range(-1.0, 1.0).unwrap();
        let result = scaler.fit_transform(&df, &["a"]).unwrap();
        assert!((result[[0, 0]] + 1.0).abs() < 1e-10);
        assert!((result[[1, 0]]).abs() < 1e-10);
        assert!((result[[2, 0]] - 1.0).abs() < 1e-10);

        assert!(MinMaxScaler::new().with_feature_range(1.0, 1.0).is_err());
    }

    #[test]
    fn test_null_at_transform() {
        let train = df!("a" => &[1.0, 2.0]).unwrap();
        let test = df!("a" => &[Some(1.0), None]).unwrap();

        let mut scaler = MinMaxScaler::new();
        scaler.fit(&train, &["a"]).unwrap();
        assert!(matches!(
            scaler.transform(&test),
            Err(CarpriceError::ValidationError(_))
        ));
    }
}
