//! Transformer → selector → estimator chain

use crate::error::{CarpriceError, Result};
use crate::preprocessing::{ColumnTransformer, FeatureSelector};
use crate::training::LinearRegression;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Unfitted pipeline template
///
/// Holds the stage configuration only. Every call to [`PipelineSpec::fit`]
/// works on its own clones of the stages and returns a new
/// [`FittedPipeline`]; the template itself is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    transformer: ColumnTransformer,
    k: usize,
    estimator: LinearRegression,
}

impl PipelineSpec {
    /// Create a template for the given stages
    pub fn new(transformer: ColumnTransformer, k: usize, estimator: LinearRegression) -> Self {
        Self {
            transformer,
            k,
            estimator,
        }
    }

    /// Template with the default estimator
    pub fn from_transformer(transformer: ColumnTransformer, k: usize) -> Self {
        Self::new(transformer, k, LinearRegression::new())
    }

    /// Copy of this template with a different number of selected features
    pub fn with_k(&self, k: usize) -> Self {
        Self {
            k,
            ..self.clone()
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn transformer(&self) -> &ColumnTransformer {
        &self.transformer
    }

    /// Fit all stages in order on the given rows
    pub fn fit(&self, x: &DataFrame, y: &Array1<f64>) -> Result<FittedPipeline> {
        if x.height() != y.len() {
            return Err(CarpriceError::ShapeError {
                expected: format!("{} target values", x.height()),
                actual: format!("{} target values", y.len()),
            });
        }

        let mut transformer = self.transformer.clone();
        let encoded = transformer.fit_transform(x)?;

        let mut selector =
            FeatureSelector::k_best(self.k).with_feature_names(transformer.feature_names_out());
        let selected = selector.fit_transform(&encoded, y)?;

        let mut estimator = self.estimator.clone();
        estimator.fit(&selected, y)?;

        Ok(FittedPipeline {
            transformer,
            selector,
            estimator,
        })
    }
}

/// A fully fitted pipeline
///
/// Prediction replays the stored stage states and never refits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedPipeline {
    transformer: ColumnTransformer,
    selector: FeatureSelector,
    estimator: LinearRegression,
}

impl FittedPipeline {
    /// Predict the target for every row of `x`
    pub fn predict(&self, x: &DataFrame) -> Result<Array1<f64>> {
        let selected = self.transform(x)?;
        self.estimator.predict(&selected)
    }

    /// Encoded and selected feature matrix fed to the estimator
    pub fn transform(&self, x: &DataFrame) -> Result<Array2<f64>> {
        let encoded = self.transformer.transform(x)?;
        self.selector.transform(&encoded)
    }

    pub fn k(&self) -> usize {
        self.selector.k()
    }

    /// Names of the encoded columns kept by the selector, in column order
    pub fn selected_feature_names(&self) -> Vec<String> {
        self.selector.selected_names().unwrap_or_default()
    }

    /// Names of every encoded column before selection
    pub fn encoded_feature_names(&self) -> Vec<String> {
        self.transformer.feature_names_out()
    }

    /// F scores of every encoded column
    pub fn feature_scores(&self) -> &[f64] {
        self.selector.scores().unwrap_or(&[])
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.estimator.coefficients()
    }

    pub fn intercept(&self) -> Option<f64> {
        self.estimator.intercept()
    }

    pub fn transformer(&self) -> &ColumnTransformer {
        &self.transformer
    }

    /// Raw columns read at prediction time
    pub fn input_columns(&self) -> Vec<String> {
        self.transformer.input_columns()
    }

    /// Selected encoded columns paired with their F scores
    pub fn selected_feature_scores(&self) -> Vec<(String, f64)> {
        let scores = self.feature_scores();
        let names = self.encoded_feature_names();
        self.selector
            .selected_indices()
            .unwrap_or_default()
            .iter()
            .filter_map(|&i| Some((names.get(i)?.clone(), *scores.get(i)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn frame() -> (DataFrame, Array1<f64>) {
        let df = df! {
            "Fuel_Type" => &["Petrol", "Diesel", "Petrol", "CNG", "Diesel", "Petrol", "Diesel", "CNG"],
            "Kms_Driven" => &[27000.0, 43000.0, 6900.0, 5200.0, 42450.0, 2071.0, 18796.0, 33429.0],
            "Age" => &[7.0, 8.0, 4.0, 10.0, 7.0, 3.0, 6.0, 6.0],
        }
        .unwrap();
        let y = array![5.59, 9.54, 9.85, 4.15, 6.87, 9.83, 8.12, 8.61];
        (df, y)
    }

    fn spec(k: usize) -> PipelineSpec {
        let transformer = ColumnTransformer::new(
            vec!["Fuel_Type".to_string()],
            vec!["Kms_Driven".to_string(), "Age".to_string()],
        );
        PipelineSpec::from_transformer(transformer, k)
    }

    #[test]
    fn test_fit_predict() {
        let (df, y) = frame();
        let fitted = spec(4).fit(&df, &y).unwrap();

        let pred = fitted.predict(&df).unwrap();
        assert_eq!(pred.len(), 8);
        assert!(pred.iter().all(|p| p.is_finite()));
        assert_eq!(fitted.k(), 4);
        assert_eq!(fitted.selected_feature_names().len(), 4);
        assert_eq!(fitted.coefficients().unwrap().len(), 4);
    }

    #[test]
    fn test_input_columns_and_selected_scores() {
        let (df, y) = frame();
        let fitted = spec(2).fit(&df, &y).unwrap();

        assert_eq!(fitted.input_columns(), vec!["Fuel_Type", "Kms_Driven", "Age"]);

        let selected = fitted.selected_feature_scores();
        let names: Vec<&str> = selected.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, fitted.selected_feature_names());
        assert!(selected.iter().all(|(_, score)| *score >= 0.0));
    }

    #[test]
    fn test_template_is_untouched() {
        let (df, y) = frame();
        let template = spec(3);
        template.fit(&df, &y).unwrap();
        assert!(!template.transformer().is_fitted());
    }

    #[test]
    fn test_scaler_ranges_follow_training_rows_only() {
        let (df, y) = frame();
        let template = spec(3);

        let head = df.head(Some(4));
        let y_head = y.slice(ndarray::s![..4]).to_owned();
        let on_head = template.fit(&head, &y_head).unwrap();
        let on_all = template.fit(&df, &y).unwrap();

        let range_head = on_head.transformer().scaler().data_range("Kms_Driven").unwrap();
        let range_all = on_all.transformer().scaler().data_range("Kms_Driven").unwrap();
        assert_eq!(range_head, (5200.0, 43000.0));
        assert_eq!(range_all, (2071.0, 43000.0));
    }

    #[test]
    fn test_unseen_category_predicts() {
        let (df, y) = frame();
        let fitted = spec(5).fit(&df, &y).unwrap();

        let unseen = df! {
            "Fuel_Type" => &["Electric"],
            "Kms_Driven" => &[10000.0],
            "Age" => &[2.0],
        }
        .unwrap();
        let pred = fitted.predict(&unseen).unwrap();
        assert_eq!(pred.len(), 1);
        assert!(pred[0].is_finite());
    }

    #[test]
    fn test_k_larger_than_encoded_width() {
        let (df, y) = frame();
        // 3 fuel categories + 2 numerics = 5 encoded columns
        assert!(matches!(
            spec(6).fit(&df, &y),
            Err(CarpriceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_target_length_mismatch() {
        let (df, _) = frame();
        let y = array![1.0, 2.0];
        assert!(matches!(spec(2).fit(&df, &y), Err(CarpriceError::ShapeError { .. })));
    }
}
