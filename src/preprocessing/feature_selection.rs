//! Univariate K-best feature selection
//!
//! Columns are scored by the F statistic of a one-variable linear regression
//! against the target, `F = r² / (1 - r²) * (n - 2)`, where `r` is the Pearson
//! correlation. The K highest-scoring columns are kept in their original order.

use crate::error::{CarpriceError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Feature selector keeping the `k` most predictive columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSelector {
    k: usize,
    selected_features: Option<Vec<usize>>,
    feature_scores: Option<Vec<f64>>,
    feature_names: Option<Vec<String>>,
    n_features_in: Option<usize>,
}

impl FeatureSelector {
    /// Create a selector keeping `k` columns
    pub fn k_best(k: usize) -> Self {
        Self {
            k,
            selected_features: None,
            feature_scores: None,
            feature_names: None,
            n_features_in: None,
        }
    }

    /// Set feature names
    pub fn with_feature_names(mut self, names: Vec<String>) -> Self {
        self.feature_names = Some(names);
        self
    }

    /// Number of columns to keep
    pub fn k(&self) -> usize {
        self.k
    }

    /// Fit the selector to data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_features = x.ncols();

        if x.nrows() != y.len() {
            return Err(CarpriceError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.k == 0 || self.k > n_features {
            return Err(CarpriceError::InvalidParameter {
                name: "k".to_string(),
                value: self.k.to_string(),
                reason: format!("must be in 1..={} (available features)", n_features),
            });
        }

        let scores: Vec<f64> = x
            .axis_iter(Axis(1))
            .map(|col| Self::f_score(col, y.view()))
            .collect();

        // Stable sort: equal scores keep the lower column index
        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut selected: Vec<usize> = order.into_iter().take(self.k).collect();
        selected.sort_unstable();

        self.n_features_in = Some(n_features);
        self.feature_scores = Some(scores);
        self.selected_features = Some(selected);
        Ok(())
    }

    /// Transform data by selecting features
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let selected = self.selected_features.as_ref().ok_or(CarpriceError::ModelNotFitted)?;

        if let Some(n_in) = self.n_features_in {
            if x.ncols() != n_in {
                return Err(CarpriceError::ShapeError {
                    expected: format!("{} columns", n_in),
                    actual: format!("{} columns", x.ncols()),
                });
            }
        }

        Ok(x.select(Axis(1), selected))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Array2<f64>> {
        self.fit(x, y)?;
        self.transform(x)
    }

    /// Get selected feature indices
    pub fn selected_indices(&self) -> Option<&[usize]> {
        self.selected_features.as_deref()
    }

    /// Get feature scores
    pub fn scores(&self) -> Option<&[f64]> {
        self.feature_scores.as_deref()
    }

    /// Get selected feature names
    pub fn selected_names(&self) -> Option<Vec<String>> {
        let indices = self.selected_features.as_ref()?;
        let names = self.feature_names.as_ref()?;

        Some(
            indices
                .iter()
                .filter_map(|&i| names.get(i).cloned())
                .collect(),
        )
    }

    /// Get feature ranking (1 = best)
    pub fn ranking(&self) -> Option<Vec<usize>> {
        let scores = self.feature_scores.as_ref()?;

        let mut indexed: Vec<(usize, f64)> = scores.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut ranking = vec![0; scores.len()];
        for (rank, (idx, _)) in indexed.into_iter().enumerate() {
            ranking[idx] = rank + 1;
        }

        Some(ranking)
    }

    // F statistic of a univariate regression; 0 for a constant column
    fn f_score(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        let n = x.len() as f64;
        if n < 3.0 {
            return 0.0;
        }

        let r = Self::compute_correlation(x, y);
        let r2 = r * r;
        if r2 >= 1.0 {
            return f64::INFINITY;
        }
        r2 / (1.0 - r2) * (n - 2.0)
    }

    // Pearson correlation over column views
    fn compute_correlation(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
        let x_mean = x.mean().unwrap_or(0.0);
        let y_mean = y.mean().unwrap_or(0.0);

        let mut sum_xy = 0.0;
        let mut sum_x2 = 0.0;
        let mut sum_y2 = 0.0;

        for (&xi, &yi) in x.iter().zip(y.iter()) {
            let dx = xi - x_mean;
            let dy = yi - y_mean;
            sum_xy += dx * dy;
            sum_x2 += dx * dx;
            sum_y2 += dy * dy;
        }

        let denom = (sum_x2 * sum_y2).sqrt();
        if denom == 0.0 {
            0.0
        } else {
            sum_xy / denom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec(
            (6, 4),
            vec![
                1.0, 5.0, 0.3, 1.0,
                2.0, 4.0, 0.1, 1.0,
                3.0, 3.1, 0.4, 1.0,
                4.0, 2.0, 0.2, 1.0,
                5.0, 1.2, 0.6, 1.0,
                6.0, 0.0, 0.5, 1.0,
            ],
        )
        .unwrap();
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        (x, y)
    }

    #[test]
    fn test_selects_k_columns() {
        let (x, y) = sample();
        for k in 1..=4 {
            let mut selector = FeatureSelector::k_best(k);
            let out = selector.fit_transform(&x, &y).unwrap();
            assert_eq!(out.ncols(), k);
            assert_eq!(out.nrows(), 6);
        }
    }

    #[test]
    fn test_keeps_strongest_in_column_order() {
        let (x, y) = sample();
        let mut selector = FeatureSelector::k_best(2);
        selector.fit(&x, &y).unwrap();

        // Column 0 is perfectly correlated, column 1 strongly anti-correlated
        assert_eq!(selector.selected_indices().unwrap(), &[0, 1]);
        let ranking = selector.ranking().unwrap();
        assert_eq!(ranking[0], 1);
        assert_eq!(ranking[3], 4);
    }

    #[test]
    fn test_constant_column_scores_zero() {
        let (x, y) = sample();
        let mut selector = FeatureSelector::k_best(1);
        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.scores().unwrap()[3], 0.0);
    }

    #[test]
    fn test_k_too_large() {
        let (x, y) = sample();
        let mut selector = FeatureSelector::k_best(5);
        assert!(matches!(
            selector.fit(&x, &y),
            Err(CarpriceError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_selected_names() {
        let (x, y) = sample();
        let names = vec!["a", "b", "c", "d"].into_iter().map(String::from).collect();
        let mut selector = FeatureSelector::k_best(2).with_feature_names(names);
        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.selected_names().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_transform_width_mismatch() {
        let (x, y) = sample();
        let mut selector = FeatureSelector::k_best(2);
        selector.fit(&x, &y).unwrap();

        let narrow = Array2::<f64>::zeros((2, 3));
        assert!(matches!(
            selector.transform(&narrow),
            Err(CarpriceError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_transform_before_fit() {
        let (x, _) = sample();
        let selector = FeatureSelector::k_best(2);
        assert!(matches!(selector.transform(&x), Err(CarpriceError::ModelNotFitted)));
    }
}
