//! Pipeline composition
//!
//! Chains the column transformer, the K-best selector and the linear
//! estimator into one fit/predict unit. Fitting always starts from fresh
//! unfitted stages, so every cross-validation fold is isolated.

mod composer;

pub use composer::{FittedPipeline, PipelineSpec};

use crate::error::Result;
use polars::prelude::*;

/// Select rows of a frame by position
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_rows_keeps_order() {
        let df = df! {
            "a" => &[10.0, 20.0, 30.0, 40.0],
        }
        .unwrap();

        let out = take_rows(&df, &[3, 0]).unwrap();
        let values: Vec<f64> = out
            .column("a")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(values, vec![40.0, 10.0]);
    }
}
