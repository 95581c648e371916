//! Cross-validated grid search over the number of selected features

use crate::error::{CarpriceError, Result};
use crate::pipeline::{take_rows, FittedPipeline, PipelineSpec};
use crate::training::{CVStrategy, CrossValidator, FoldScores};
use super::config::{Scoring, SearchConfig};
use ndarray::Array1;
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Configured,
    Searching,
    Completed,
    Failed,
}

/// Result of evaluating one candidate K
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateOutcome {
    Scored {
        mean_score: f64,
        std_score: f64,
        fold_scores: Vec<f64>,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub k: usize,
    pub outcome: CandidateOutcome,
}

impl CandidateResult {
    /// Mean cross-validated score, if the candidate was scored
    pub fn mean_score(&self) -> Option<f64> {
        match &self.outcome {
            CandidateOutcome::Scored { mean_score, .. } => Some(*mean_score),
            CandidateOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, CandidateOutcome::Failed { .. })
    }
}

/// Outcome of a completed search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Winning number of selected features
    pub best_k: usize,
    /// Mean cross-validated score of the winner
    pub best_score: f64,
    /// Winner refit on every training row
    pub best_pipeline: FittedPipeline,
    /// One entry per grid value, in grid order
    pub candidates: Vec<CandidateResult>,
    pub scoring: Scoring,
    pub n_splits: usize,
}

impl SearchResult {
    pub fn best_candidate(&self) -> Option<&CandidateResult> {
        self.candidates
            .iter()
            .find(|c| c.k == self.best_k && !c.is_failed())
    }

    /// Candidates that produced a score
    pub fn scored(&self) -> impl Iterator<Item = &CandidateResult> {
        self.candidates.iter().filter(|c| !c.is_failed())
    }

    /// Candidates excluded from selection
    pub fn failed(&self) -> impl Iterator<Item = &CandidateResult> {
        self.candidates.iter().filter(|c| c.is_failed())
    }
}

// Rows of one fold, materialised once and shared by every candidate
struct Fold {
    x_train: DataFrame,
    y_train: Array1<f64>,
    x_test: DataFrame,
    y_test: Array1<f64>,
}

/// Exhaustive search over `selector__k`
pub struct GridSearchCV {
    spec: PipelineSpec,
    config: SearchConfig,
    state: SearchState,
}

impl GridSearchCV {
    pub fn new(spec: PipelineSpec, config: SearchConfig) -> Self {
        Self {
            spec,
            config,
            state: SearchState::Configured,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Evaluate every candidate and refit the best one on all rows
    pub fn fit(&mut self, x: &DataFrame, y: &Array1<f64>) -> Result<SearchResult> {
        self.config.validate()?;
        if x.height() != y.len() {
            return Err(CarpriceError::ShapeError {
                expected: format!("{} target values", x.height()),
                actual: format!("{} target values", y.len()),
            });
        }

        self.state = SearchState::Searching;
        match self.search(x, y) {
            Ok(result) => {
                self.state = SearchState::Completed;
                Ok(result)
            }
            Err(e) => {
                self.state = SearchState::Failed;
                Err(e)
            }
        }
    }

    fn search(&self, x: &DataFrame, y: &Array1<f64>) -> Result<SearchResult> {
        let start = Instant::now();
        let grid = &self.config.param_grid;

        info!(
            n_candidates = grid.len(),
            n_splits = self.config.cv_folds,
            n_samples = x.height(),
            scoring = %self.config.scoring,
            "Starting grid search"
        );

        let candidates = match self.build_folds(x, y) {
            Ok(folds) => self.evaluate(&folds)?,
            Err(e) => {
                // No split means no candidate can be scored
                let reason = e.to_string();
                grid.iter()
                    .map(|&k| CandidateResult {
                        k,
                        outcome: CandidateOutcome::Failed { reason: reason.clone() },
                    })
                    .collect()
            }
        };

        for candidate in &candidates {
            match &candidate.outcome {
                CandidateOutcome::Scored { mean_score, std_score, .. } => {
                    info!(k = candidate.k, mean_score, std_score, "Candidate scored");
                }
                CandidateOutcome::Failed { reason } => {
                    warn!(k = candidate.k, reason = %reason, "Candidate failed");
                }
            }
        }

        // Strict comparison keeps the earliest candidate among ties
        let mut best: Option<(usize, f64)> = None;
        for candidate in &candidates {
            if let Some(score) = candidate.mean_score() {
                if best.map_or(true, |(_, b)| score > b) {
                    best = Some((candidate.k, score));
                }
            }
        }

        let (best_k, best_score) = best.ok_or(CarpriceError::SearchExhausted {
            n_candidates: candidates.len(),
        })?;

        info!(best_k, best_score, "Refitting best candidate on all rows");
        let best_pipeline = self.spec.with_k(best_k).fit(x, y)?;

        info!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            "Grid search completed"
        );

        Ok(SearchResult {
            best_k,
            best_score,
            best_pipeline,
            candidates,
            scoring: self.config.scoring,
            n_splits: self.config.cv_folds,
        })
    }

    fn build_folds(&self, x: &DataFrame, y: &Array1<f64>) -> Result<Vec<Fold>> {
        let splitter = CrossValidator::new(CVStrategy::KFold {
            n_splits: self.config.cv_folds,
            shuffle: self.config.shuffle,
        })
        .with_seed(self.config.random_state);

        splitter
            .split(x.height())?
            .into_iter()
            .map(|split| {
                Ok(Fold {
                    x_train: take_rows(x, &split.train_indices)?,
                    y_train: split.train_indices.iter().map(|&i| y[i]).collect(),
                    x_test: take_rows(x, &split.test_indices)?,
                    y_test: split.test_indices.iter().map(|&i| y[i]).collect(),
                })
            })
            .collect()
    }

    fn evaluate(&self, folds: &[Fold]) -> Result<Vec<CandidateResult>> {
        let grid = &self.config.param_grid;
        let jobs: Vec<(usize, usize)> = (0..grid.len())
            .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
            .collect();

        let run = || -> Vec<Result<f64>> {
            jobs.par_iter()
                .map(|&(c, f)| self.score_fold(grid[c], &folds[f]))
                .collect()
        };

        let fold_results = match self.config.n_jobs {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| CarpriceError::ThreadPoolError(e.to_string()))?;
                pool.install(run)
            }
            None => run(),
        };

        // par_iter preserves job order, so chunks line up with candidates
        let mut fold_results = fold_results.into_iter();
        let candidates = grid
            .iter()
            .map(|&k| {
                let results: Vec<Result<f64>> = fold_results.by_ref().take(folds.len()).collect();
                Self::reduce_candidate(k, results)
            })
            .collect();

        Ok(candidates)
    }

    fn score_fold(&self, k: usize, fold: &Fold) -> Result<f64> {
        let fitted = self.spec.with_k(k).fit(&fold.x_train, &fold.y_train)?;
        let y_pred = fitted.predict(&fold.x_test)?;
        self.config.scoring.score(&fold.y_test, &y_pred)
    }

    fn reduce_candidate(k: usize, results: Vec<Result<f64>>) -> CandidateResult {
        let mut scores = Vec::with_capacity(results.len());
        for (fold_idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(score) if score.is_finite() => {
                    debug!(k, fold = fold_idx, score, "Fold scored");
                    scores.push(score);
                }
                Ok(score) => {
                    return CandidateResult {
                        k,
                        outcome: CandidateOutcome::Failed {
                            reason: format!("non-finite score {} on fold {}", score, fold_idx),
                        },
                    };
                }
                Err(e) => {
                    return CandidateResult {
                        k,
                        outcome: CandidateOutcome::Failed {
                            reason: format!("fold {}: {}", fold_idx, e),
                        },
                    };
                }
            }
        }

        let summary = FoldScores::new(scores);
        CandidateResult {
            k,
            outcome: CandidateOutcome::Scored {
                mean_score: summary.mean,
                std_score: summary.std,
                fold_scores: summary.scores,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::ColumnTransformer;

    fn synthetic(n: usize) -> (DataFrame, Array1<f64>) {
        let fuels = ["Petrol", "Diesel", "CNG"];
        let gears = ["Manual", "Automatic"];

        let fuel: Vec<&str> = (0..n).map(|i| fuels[i % 3]).collect();
        let gear: Vec<&str> = (0..n).map(|i| gears[(i / 3) % 2]).collect();
        let kms: Vec<f64> = (0..n).map(|i| ((i * 37) % 101) as f64 * 500.0).collect();
        let age: Vec<f64> = (0..n).map(|i| ((i * 7) % 11 + 1) as f64).collect();
        let selling: Vec<f64> = (0..n).map(|i| ((i * 13) % 17) as f64 * 0.5 + 1.0).collect();

        let y: Array1<f64> = (0..n)
            .map(|i| {
                let fuel_bonus = [1.0, 2.5, 0.0][i % 3];
                1.2 * selling[i] - 0.3 * age[i] - 0.00001 * kms[i] + fuel_bonus + 0.05 * (i as f64).sin()
            })
            .collect();

        let df = df! {
            "Fuel_Type" => fuel,
            "Transmission" => gear,
            "Kms_Driven" => kms,
            "Age" => age,
            "Selling_Price" => selling,
        }
        .unwrap();
        (df, y)
    }

    fn spec() -> PipelineSpec {
        let transformer = ColumnTransformer::new(
            vec!["Fuel_Type".to_string(), "Transmission".to_string()],
            vec!["Kms_Driven".to_string(), "Age".to_string(), "Selling_Price".to_string()],
        );
        PipelineSpec::from_transformer(transformer, 2)
    }

    #[test]
    fn test_search_completes() {
        let (df, y) = synthetic(60);
        let config = SearchConfig::new()
            .with_param_grid(2..=5)
            .with_cv_folds(5)
            .with_random_state(3);

        let mut search = GridSearchCV::new(spec(), config);
        assert_eq!(search.state(), SearchState::Configured);

        let result = search.fit(&df, &y).unwrap();
        assert_eq!(search.state(), SearchState::Completed);
        assert_eq!(result.candidates.len(), 4);
        assert!(result.scored().all(|c| c.mean_score().unwrap() <= 0.0));
        assert_eq!(result.best_pipeline.k(), result.best_k);

        let best = result.best_candidate().unwrap();
        assert_eq!(best.mean_score(), Some(result.best_score));
        for c in result.scored() {
            assert!(c.mean_score().unwrap() <= result.best_score);
        }
    }

    #[test]
    fn test_oversized_k_fails_alone() {
        let (df, y) = synthetic(60);
        // 3 + 2 one-hot columns and 3 numerics give 8 encoded columns
        let config = SearchConfig::new()
            .with_param_grid(vec![2, 9, 8, 30])
            .with_cv_folds(4)
            .with_random_state(1);

        let result = GridSearchCV::new(spec(), config).fit(&df, &y).unwrap();

        let failed: Vec<usize> = result.failed().map(|c| c.k).collect();
        assert_eq!(failed, vec![9, 30]);
        assert!(result.best_k == 2 || result.best_k == 8);
    }

    #[test]
    fn test_too_few_rows_exhausts_search() {
        let (df, y) = synthetic(8);
        let config = SearchConfig::new().with_param_grid(2..=5).with_cv_folds(10);

        let mut search = GridSearchCV::new(spec(), config);
        let err = search.fit(&df, &y).unwrap_err();
        assert!(matches!(err, CarpriceError::SearchExhausted { n_candidates: 4 }));
        assert_eq!(search.state(), SearchState::Failed);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let (df, y) = synthetic(50);
        let config = SearchConfig::new()
            .with_param_grid(2..=6)
            .with_cv_folds(5)
            .with_random_state(11)
            .with_n_jobs(2);

        let a = GridSearchCV::new(spec(), config.clone()).fit(&df, &y).unwrap();
        let b = GridSearchCV::new(spec(), config).fit(&df, &y).unwrap();

        assert_eq!(a.best_k, b.best_k);
        assert_eq!(a.candidates, b.candidates);
    }

    #[test]
    fn test_invalid_config_rejected_before_search() {
        let (df, y) = synthetic(20);
        let config = SearchConfig::new().with_param_grid(Vec::new());
        let mut search = GridSearchCV::new(spec(), config);
        assert!(matches!(search.fit(&df, &y), Err(CarpriceError::ConfigError(_))));
        assert_eq!(search.state(), SearchState::Configured);
    }
}
