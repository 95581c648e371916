//! Search configuration

use crate::error::{CarpriceError, Result};
use crate::training::RegressionMetrics;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Fold scoring rule; higher is always better
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Negated mean squared error
    #[default]
    NegMeanSquaredError,
    /// Negated mean absolute error
    NegMeanAbsoluteError,
    /// Coefficient of determination
    R2,
}

impl Scoring {
    /// Score predictions against the held-out targets
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        let metrics = RegressionMetrics::compute(y_true, y_pred)?;
        Ok(match self {
            Scoring::NegMeanSquaredError => -metrics.mse,
            Scoring::NegMeanAbsoluteError => -metrics.mae,
            Scoring::R2 => metrics.r2,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scoring::NegMeanSquaredError => "neg_mean_squared_error",
            Scoring::NegMeanAbsoluteError => "neg_mean_absolute_error",
            Scoring::R2 => "r2",
        }
    }
}

impl std::fmt::Display for Scoring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for the K grid search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate numbers of selected features, evaluated in this order
    pub param_grid: Vec<usize>,

    /// Number of cross-validation folds
    pub cv_folds: usize,

    /// Shuffle rows before splitting into folds
    pub shuffle: bool,

    /// Fold scoring rule
    pub scoring: Scoring,

    /// Worker threads; `None` uses every core
    pub n_jobs: Option<usize>,

    /// Seed for the fold shuffle; `None` draws from entropy
    pub random_state: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            param_grid: (2..=24).collect(),
            cv_folds: 10,
            shuffle: true,
            scoring: Scoring::NegMeanSquaredError,
            n_jobs: None,
            random_state: None,
        }
    }
}

impl SearchConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the candidate grid
    pub fn with_param_grid(mut self, grid: impl IntoIterator<Item = usize>) -> Self {
        self.param_grid = grid.into_iter().collect();
        self
    }

    /// Builder method to set the number of folds
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_scoring(mut self, scoring: Scoring) -> Self {
        self.scoring = scoring;
        self
    }

    /// Builder method to bound parallel execution
    pub fn with_n_jobs(mut self, n: usize) -> Self {
        self.n_jobs = Some(n);
        self
    }

    /// Builder method to make fold assignment reproducible
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Check the configuration before a search starts
    pub fn validate(&self) -> Result<()> {
        if self.param_grid.is_empty() {
            return Err(CarpriceError::ConfigError(
                "param_grid must contain at least one candidate".to_string(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(CarpriceError::ConfigError(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.n_jobs == Some(0) {
            return Err(CarpriceError::ConfigError(
                "n_jobs must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
