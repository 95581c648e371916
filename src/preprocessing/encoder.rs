//! Categorical encoding

use crate::error::{CarpriceError, Result};
use super::string_column;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// What to do with a category that was not seen during fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandleUnknown {
    /// Encode the value as an all-zero block
    #[default]
    Ignore,
    /// Fail the transform
    Error,
}

/// Learned vocabulary of one column, kept sorted
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnVocabulary {
    column: String,
    categories: Vec<String>,
}

/// One-hot encoder over string-cast columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    handle_unknown: HandleUnknown,
    vocabularies: Vec<ColumnVocabulary>,
    is_fitted: bool,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new(HandleUnknown::Ignore)
    }
}

impl OneHotEncoder {
    /// Create a new encoder
    pub fn new(handle_unknown: HandleUnknown) -> Self {
        Self {
            handle_unknown,
            vocabularies: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn the category vocabulary of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut vocabularies = Vec::with_capacity(columns.len());
        for col_name in columns {
            let series = string_column(df, col_name)?;
            let ca = series.str()?;

            let mut categories: Vec<String> = ca
                .into_iter()
                .flatten()
                .map(|s| s.to_string())
                .collect();
            categories.sort_unstable();
            categories.dedup();

            vocabularies.push(ColumnVocabulary {
                column: col_name.to_string(),
                categories,
            });
        }

        self.vocabularies = vocabularies;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode the fitted columns; one block of indicator columns per input column
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(CarpriceError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_features_out()));
        let mut offset = 0;

        for vocab in &self.vocabularies {
            let series = string_column(df, &vocab.column)?;
            let ca = series.str()?;

            for (row, value) in ca.into_iter().enumerate() {
                let position = value.and_then(|v| {
                    vocab.categories.binary_search_by(|c| c.as_str().cmp(v)).ok()
                });
                match position {
                    Some(pos) => out[[row, offset + pos]] = 1.0,
                    None if self.handle_unknown == HandleUnknown::Error => {
                        return Err(CarpriceError::PreprocessingError(format!(
                            "unknown category {:?} in column '{}'",
                            value, vocab.column
                        )));
                    }
                    None => {}
                }
            }

            offset += vocab.categories.len();
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Total number of indicator columns produced
    pub fn n_features_out(&self) -> usize {
        self.vocabularies.iter().map(|v| v.categories.len()).sum()
    }

    /// Output names in `<column>_<category>` form
    pub fn feature_names_out(&self) -> Vec<String> {
        self.vocabularies
            .iter()
            .flat_map(|v| {
                v.categories
                    .iter()
                    .map(move |c| format!("{}_{}", v.column, c))
            })
            .collect()
    }

    /// Learned categories of one column
    pub fn categories(&self, column: &str) -> Option<&[String]> {
        self.vocabularies
            .iter()
            .find(|v| v.column == column)
            .map(|v| v.categories.as_slice())
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
