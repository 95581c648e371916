//! Column routing: categorical → one-hot, numerical → min-max, rest → remainder
//!
//! Output column order is always the categorical block, then the numerical
//! block, then the remainder block.

use crate::error::{CarpriceError, Result};
use super::{numeric_column, HandleUnknown, MinMaxScaler, OneHotEncoder};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Treatment of columns not listed as categorical or numerical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Remainder {
    /// Keep them, cast to f64, after the numerical block
    #[default]
    Passthrough,
    /// Discard them
    Drop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnTransformer {
    categorical: Vec<String>,
    numerical: Vec<String>,
    remainder: Remainder,
    encoder: OneHotEncoder,
    scaler: MinMaxScaler,
    passthrough: Vec<String>,
    n_features_in: usize,
    is_fitted: bool,
}

impl ColumnTransformer {
    /// Create a transformer for the given column groups
    pub fn new(categorical: Vec<String>, numerical: Vec<String>) -> Self {
        Self {
            categorical,
            numerical,
            remainder: Remainder::Passthrough,
            encoder: OneHotEncoder::new(HandleUnknown::Ignore),
            scaler: MinMaxScaler::new(),
            passthrough: Vec::new(),
            n_features_in: 0,
            is_fitted: false,
        }
    }

    /// Set the remainder policy
    pub fn with_remainder(mut self, remainder: Remainder) -> Self {
        self.remainder = remainder;
        self
    }

    /// Set how unknown categories are handled
    pub fn with_handle_unknown(mut self, handle_unknown: HandleUnknown) -> Self {
        self.encoder = OneHotEncoder::new(handle_unknown);
        self
    }

    /// Replace the numerical scaler (e.g. a different feature range)
    pub fn with_scaler(mut self, scaler: MinMaxScaler) -> Self {
        self.scaler = scaler;
        self
    }

    /// Fit encoder and scaler on the training frame
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        if let Some(shared) = self.categorical.iter().find(|c| self.numerical.contains(c)) {
            return Err(CarpriceError::PreprocessingError(format!(
                "column '{}' is listed as both categorical and numerical",
                shared
            )));
        }

        let categorical: Vec<&str> = self.categorical.iter().map(|s| s.as_str()).collect();
        let numerical: Vec<&str> = self.numerical.iter().map(|s| s.as_str()).collect();

        self.encoder.fit(df, &categorical)?;
        self.scaler.fit(df, &numerical)?;

        self.passthrough = match self.remainder {
            Remainder::Passthrough => df
                .get_column_names()
                .into_iter()
                .map(|name| name.to_string())
                .filter(|name| !self.categorical.contains(name) && !self.numerical.contains(name))
                .collect(),
            Remainder::Drop => Vec::new(),
        };

        self.n_features_in = df.width();
        self.is_fitted = true;
        Ok(self)
    }

    /// Transform a frame with the fitted state; never refits
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CarpriceError::ModelNotFitted);
        }

        let encoded = self.encoder.transform(df)?;
        let scaled = self.scaler.transform(df)?;
        let passthrough = self.transform_passthrough(df)?;

        let matrix = concatenate(
            Axis(1),
            &[encoded.view(), scaled.view(), passthrough.view()],
        )?;
        Ok(matrix)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    fn transform_passthrough(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((df.height(), self.passthrough.len()));
        for (col_idx, name) in self.passthrough.iter().enumerate() {
            let series = numeric_column(df, name).map_err(|e| match e {
                CarpriceError::DataError(msg) => CarpriceError::PreprocessingError(format!(
                    "passthrough column '{}' is not numeric: {}",
                    name, msg
                )),
                other => other,
            })?;
            let ca = series.f64()?;
            for (row, value) in ca.into_iter().enumerate() {
                out[[row, col_idx]] = value.ok_or_else(|| {
                    CarpriceError::ValidationError(format!(
                        "null value in passthrough column '{}' at row {}",
                        name, row
                    ))
                })?;
            }
        }
        Ok(out)
    }

    /// Names of the produced columns, in output order
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names = self.encoder.feature_names_out();
        names.extend(self.scaler.feature_names_out());
        names.extend(self.passthrough.iter().cloned());
        names
    }

    /// Width of the encoded feature space
    pub fn n_features_out(&self) -> usize {
        self.encoder.n_features_out() + self.numerical.len() + self.passthrough.len()
    }

    pub fn n_features_in(&self) -> usize {
        self.n_features_in
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical
    }

    pub fn numerical_features(&self) -> &[String] {
        &self.numerical
    }

    pub fn passthrough_features(&self) -> &[String] {
        &self.passthrough
    }

    /// Every input column a transform reads, in block order
    pub fn input_columns(&self) -> Vec<String> {
        self.categorical
            .iter()
            .chain(&self.numerical)
            .chain(&self.passthrough)
            .cloned()
            .collect()
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &MinMaxScaler {
        &self.scaler
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicles() -> DataFrame {
        df!(
            "Fuel_Type" => &["Petrol", "Diesel", "Petrol", "CNG"],
            "Transmission" => &["Manual", "Automatic", "Manual", "Manual"],
            "Driven_kms" => &[10000.0, 50000.0, 30000.0, 20000.0],
            "Age" => &[3.0, 7.0, 5.0, 4.0],
            "Doors" => &[4i64, 5, 4, 3]
        )
        .unwrap()
    }

    fn transformer() -> ColumnTransformer {
        ColumnTransformer::new(
            vec!["Fuel_Type".to_string(), "Transmission".to_string()],
            vec!["Driven_kms".to_string(), "Age".to_string()],
        )
    }

    #[test]
    fn test_output_layout() {
        let mut ct = transformer();
        let out = ct.fit_transform(&vehicles()).unwrap();

        // 3 fuel + 2 transmission + 2 numeric + 1 passthrough
        assert_eq!(out.ncols(), 8);
        assert_eq!(ct.n_features_out(), 8);
        assert_eq!(
            ct.feature_names_out(),
            vec![
                "Fuel_Type_CNG",
                "Fuel_Type_Diesel",
                "Fuel_Type_Petrol",
                "Transmission_Automatic",
                "Transmission_Manual",
                "Driven_kms",
                "Age",
                "Doors",
            ]
        );
        // Passthrough keeps raw values
        assert_eq!(out[[1, 7]], 5.0);
        // Numerical block is scaled into [0, 1]
        assert!(out.column(5).iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_remainder_drop() {
        let mut ct = transformer().with_remainder(Remainder::Drop);
        let out = ct.fit_transform(&vehicles()).unwrap();
        assert_eq!(out.ncols(), 7);
        assert!(ct.passthrough_features().is_empty());
    }

    #[test]
    fn test_transform_is_repeatable() {
        let mut ct = transformer();
        ct.fit(&vehicles()).unwrap();

        let held_out = df!(
            "Fuel_Type" => &["Electric", "Diesel"],
            "Transmission" => &["Manual", "Manual"],
            "Driven_kms" => &[70000.0, 15000.0],
            "Age" => &[2.0, 9.0],
            "Doors" => &[4i64, 4]
        )
        .unwrap();

        let first = ct.transform(&held_out).unwrap();
        let second = ct.transform(&held_out).unwrap();
        assert_eq!(first, second);
        // Unseen fuel type encodes as zeros
        assert_eq!(first.row(0).slice(ndarray::s![0..3]).sum(), 0.0);
    }

    #[test]
    fn test_overlapping_groups_rejected() {
        let mut ct = ColumnTransformer::new(
            vec!["Age".to_string()],
            vec!["Age".to_string()],
        );
        assert!(matches!(
            ct.fit(&vehicles()),
            Err(CarpriceError::PreprocessingError(_))
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        assert!(matches!(
            transformer().transform(&vehicles()),
            Err(CarpriceError::ModelNotFitted)
        ));
    }
}
