//! Integration tests for the cross-validated K search

use carprice::optimizer::{CandidateOutcome, GridSearchCV, Scoring, SearchConfig, SearchState};
use carprice::pipeline::PipelineSpec;
use carprice::preprocessing::ColumnTransformer;
use carprice::CarpriceError;
use ndarray::Array1;
use polars::prelude::*;

fn listings(n: usize) -> (DataFrame, Array1<f64>) {
    let fuels = ["Petrol", "Diesel", "CNG"];
    let gears = ["Manual", "Automatic"];

    let fuel: Vec<&str> = (0..n).map(|i| fuels[i % 3]).collect();
    let gear: Vec<&str> = (0..n).map(|i| gears[(i / 4) % 2]).collect();
    let kms: Vec<f64> = (0..n).map(|i| ((i * 7919) % 90_000) as f64 + 500.0).collect();
    let age: Vec<f64> = (0..n).map(|i| ((i * 31) % 15 + 1) as f64).collect();
    let selling: Vec<f64> = (0..n).map(|i| ((i * 17) % 23) as f64 * 0.6 + 0.4).collect();

    let y: Array1<f64> = (0..n)
        .map(|i| {
            1.5 * selling[i] - 0.2 * age[i] - 0.00002 * kms[i]
                + [0.8, 2.0, 0.0][i % 3]
                + 0.1 * ((i * 13) as f64).sin()
        })
        .collect();

    let df = df!(
        "Fuel_Type" => fuel,
        "Transmission" => gear,
        "Driven_kms" => kms,
        "Age" => age,
        "Selling_Price" => selling
    )
    .unwrap();
    (df, y)
}

fn spec() -> PipelineSpec {
    let transformer = ColumnTransformer::new(
        vec!["Fuel_Type".to_string(), "Transmission".to_string()],
        vec!["Driven_kms".to_string(), "Age".to_string(), "Selling_Price".to_string()],
    );
    PipelineSpec::from_transformer(transformer, 2)
}

#[test]
fn test_default_grid_runs_to_completion() {
    let (df, y) = listings(200);
    // 8 encoded columns, so K in 9..=24 fails and 2..=8 are scored
    let mut search = GridSearchCV::new(spec(), SearchConfig::default().with_random_state(5));
    let result = search.fit(&df, &y).unwrap();

    assert_eq!(search.state(), SearchState::Completed);
    assert_eq!(result.candidates.len(), 23);
    assert_eq!(result.scored().count(), 7);
    assert_eq!(result.failed().count(), 16);
    assert!(result.failed().all(|c| c.k > 8));
    assert!((2..=8).contains(&result.best_k));
    assert_eq!(result.n_splits, 10);
}

#[test]
fn test_candidates_keep_grid_order() {
    let (df, y) = listings(80);
    let config = SearchConfig::new()
        .with_param_grid(vec![5, 2, 7, 3])
        .with_cv_folds(5)
        .with_random_state(2);

    let result = GridSearchCV::new(spec(), config).fit(&df, &y).unwrap();
    let ks: Vec<usize> = result.candidates.iter().map(|c| c.k).collect();
    assert_eq!(ks, vec![5, 2, 7, 3]);
}

#[test]
fn test_fold_scores_are_recorded() {
    let (df, y) = listings(60);
    let config = SearchConfig::new()
        .with_param_grid(2..=4)
        .with_cv_folds(6)
        .with_random_state(8);

    let result = GridSearchCV::new(spec(), config).fit(&df, &y).unwrap();
    for candidate in &result.candidates {
        match &candidate.outcome {
            CandidateOutcome::Scored { mean_score, std_score, fold_scores } => {
                assert_eq!(fold_scores.len(), 6);
                let mean = fold_scores.iter().sum::<f64>() / 6.0;
                assert!((mean - mean_score).abs() < 1e-12);
                assert!(*std_score >= 0.0);
                assert!(fold_scores.iter().all(|s| *s <= 0.0));
            }
            CandidateOutcome::Failed { reason } => panic!("k={} failed: {}", candidate.k, reason),
        }
    }
}

#[test]
fn test_eight_rows_ten_folds_is_exhausted() {
    let (df, y) = listings(8);
    let config = SearchConfig::new().with_param_grid(2..=5);

    let mut search = GridSearchCV::new(spec(), config);
    match search.fit(&df, &y) {
        Err(CarpriceError::SearchExhausted { n_candidates }) => assert_eq!(n_candidates, 4),
        other => panic!("expected SearchExhausted, got {:?}", other.map(|r| r.best_k)),
    }
    assert_eq!(search.state(), SearchState::Failed);
}

#[test]
fn test_all_k_invalid_is_exhausted() {
    let (df, y) = listings(50);
    let config = SearchConfig::new()
        .with_param_grid(vec![0, 40])
        .with_cv_folds(5);

    let result = GridSearchCV::new(spec(), config).fit(&df, &y);
    assert!(matches!(result, Err(CarpriceError::SearchExhausted { n_candidates: 2 })));
}

#[test]
fn test_serial_and_parallel_agree() {
    let (df, y) = listings(70);
    let base = SearchConfig::new()
        .with_param_grid(2..=8)
        .with_cv_folds(7)
        .with_random_state(21);

    let serial = GridSearchCV::new(spec(), base.clone().with_n_jobs(1)).fit(&df, &y).unwrap();
    let parallel = GridSearchCV::new(spec(), base.with_n_jobs(4)).fit(&df, &y).unwrap();

    assert_eq!(serial.best_k, parallel.best_k);
    assert_eq!(serial.candidates, parallel.candidates);
}

#[test]
fn test_alternative_scoring() {
    let (df, y) = listings(60);
    let config = SearchConfig::new()
        .with_param_grid(2..=6)
        .with_cv_folds(5)
        .with_scoring(Scoring::R2)
        .with_random_state(4);

    let result = GridSearchCV::new(spec(), config).fit(&df, &y).unwrap();
    assert_eq!(result.scoring, Scoring::R2);
    assert!(result.best_score <= 1.0);
    assert!(result.best_score > 0.5);
}

#[test]
fn test_best_pipeline_refit_on_all_rows() {
    let (df, y) = listings(90);
    let config = SearchConfig::new()
        .with_param_grid(2..=8)
        .with_cv_folds(5)
        .with_random_state(13);

    let result = GridSearchCV::new(spec(), config).fit(&df, &y).unwrap();
    let refit = spec().with_k(result.best_k).fit(&df, &y).unwrap();

    assert_eq!(
        result.best_pipeline.predict(&df).unwrap(),
        refit.predict(&df).unwrap()
    );
}
