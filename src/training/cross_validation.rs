//! Cross-validation splitting
//!
//! The search draws one set of folds per run and hands the same folds to
//! every candidate, so candidates differ only in K.

use crate::error::{CarpriceError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// Contiguous folds over an optionally shuffled row order
    KFold { n_splits: usize, shuffle: bool },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 10, shuffle: true }
    }
}

/// Row positions of one fold
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Splits row positions into folds
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    seed: Option<u64>,
}

impl CrossValidator {
    pub fn new(strategy: CVStrategy) -> Self {
        Self { strategy, seed: None }
    }

    /// Fix the shuffle; `None` draws a fresh order from entropy on each split
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_splits(&self) -> usize {
        match self.strategy {
            CVStrategy::KFold { n_splits, .. } => n_splits,
        }
    }

    /// Partition `0..n_samples` into test folds
    ///
    /// Fold sizes differ by at most one row; the first `n_samples % n_splits`
    /// folds carry the extra row.
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        let CVStrategy::KFold { n_splits, shuffle } = self.strategy;
        if n_splits < 2 {
            return Err(CarpriceError::ValidationError(format!(
                "k-fold needs at least 2 folds, got {}",
                n_splits
            )));
        }
        if n_samples < n_splits {
            return Err(CarpriceError::ValidationError(format!(
                "cannot split {} rows into {} folds",
                n_samples, n_splits
            )));
        }

        let order = self.row_order(n_samples, shuffle);
        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;
        let boundary = |fold: usize| fold * base + fold.min(remainder);

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let (start, end) = (boundary(fold_idx), boundary(fold_idx + 1));
                let mut train_indices = Vec::with_capacity(n_samples - (end - start));
                train_indices.extend_from_slice(&order[..start]);
                train_indices.extend_from_slice(&order[end..]);
                CVSplit {
                    train_indices,
                    test_indices: order[start..end].to_vec(),
                    fold_idx,
                }
            })
            .collect();
        Ok(splits)
    }

    fn row_order(&self, n_samples: usize, shuffle: bool) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            let mut rng = self
                .seed
                .map(ChaCha8Rng::seed_from_u64)
                .unwrap_or_else(ChaCha8Rng::from_entropy);
            order.shuffle(&mut rng);
        }
        order
    }
}

/// Per-fold scores of one candidate with their mean and population deviation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldScores {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl FoldScores {
    pub fn new(scores: Vec<f64>) -> Self {
        let n = scores.len().max(1) as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let std = (scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n).sqrt();
        Self { scores, mean, std }
    }
}
