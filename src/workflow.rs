//! End-to-end training run
//!
//! load → derive → search → persist → report, driven entirely by a
//! [`WorkflowConfig`]. Scoring and evaluating a stored model on new tables
//! lives here too, so the CLI stays a thin shell.

use crate::config::WorkflowConfig;
use crate::dataset::{categorical_features, derive_features, inference_frame, numerical_features};
use crate::error::{CarpriceError, Result};
use crate::export::{save_model, ModelArtifact};
use crate::optimizer::{GridSearchCV, SearchResult};
use crate::pipeline::PipelineSpec;
use crate::preprocessing::ColumnTransformer;
use crate::report::{evaluate, write_metrics, MetricsRecord};
use crate::utils::DataLoader;
use ndarray::Array1;
use polars::prelude::*;
use tracing::info;

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub search: SearchResult,
    pub metrics: Vec<MetricsRecord>,
}

/// Build the unfitted pipeline template for a derived feature frame
pub fn pipeline_template(features: &DataFrame, config: &WorkflowConfig) -> PipelineSpec {
    let categorical = categorical_features(features, &config.schema);
    let numerical = numerical_features(features, &config.schema);
    let k = config.search.param_grid.first().copied().unwrap_or(2);
    PipelineSpec::from_transformer(ColumnTransformer::new(categorical, numerical), k)
}

/// Search, persist and report on already-derived partitions
pub fn train_on_frames(
    config: &WorkflowConfig,
    train: (&DataFrame, &Array1<f64>),
    test: (&DataFrame, &Array1<f64>),
) -> Result<WorkflowOutcome> {
    config.validate()?;
    let (x_train, y_train) = train;
    let (x_test, y_test) = test;

    let spec = pipeline_template(x_train, config);
    info!(
        categorical = ?spec.transformer().categorical_features(),
        numerical = ?spec.transformer().numerical_features(),
        "Pipeline configured"
    );

    let search = GridSearchCV::new(spec, config.search.clone()).fit(x_train, y_train)?;

    let artifact = ModelArtifact::from_search(&search, &config.schema);
    save_model(&config.model_path, &artifact)?;

    let metrics = evaluate(
        &search.best_pipeline,
        &[("train", x_train, y_train), ("test", x_test, y_test)],
    )?;
    write_metrics(&config.metrics_path, &metrics)?;
    info!(path = %config.metrics_path.display(), "Metrics written");

    Ok(WorkflowOutcome { search, metrics })
}

/// Run the complete workflow from the configured input files
pub fn run_training(config: &WorkflowConfig) -> Result<WorkflowOutcome> {
    config.validate()?;
    let loader = DataLoader::new();

    let train_raw = loader.load_auto(&config.train_path)?;
    let test_raw = loader.load_auto(&config.test_path)?;

    let (x_train, y_train) = derive_features(&train_raw, &config.schema)?;
    let (x_test, y_test) = derive_features(&test_raw, &config.schema)?;
    info!(
        train_rows = x_train.height(),
        test_rows = x_test.height(),
        features = x_train.width(),
        "Features derived"
    );

    train_on_frames(config, (&x_train, &y_train), (&x_test, &y_test))
}

/// Predict every row of a raw table with a stored model
///
/// The output has a `row` index, the name column when the table carries one
/// and a `prediction` column, with one row per input row.
pub fn predict_table(artifact: &ModelArtifact, raw: &DataFrame) -> Result<DataFrame> {
    let schema = &artifact.metadata.schema;
    let features = inference_frame(raw, schema, &artifact.pipeline.input_columns())?;
    let predictions = artifact.pipeline.predict(&features)?;

    let rows: Vec<u32> = (0..raw.height() as u32).collect();
    let mut columns = vec![Column::new("row".into(), rows)];
    if let Ok(name) = raw.column(&schema.name_column) {
        columns.push(name.clone());
    }
    columns.push(Column::new("prediction".into(), predictions.to_vec()));

    info!(rows = raw.height(), "Predictions computed");
    Ok(DataFrame::new(columns)?)
}

/// Score a stored model on a labelled raw table
pub fn evaluate_table(artifact: &ModelArtifact, raw: &DataFrame, name: &str) -> Result<MetricsRecord> {
    let (x, y) = derive_features(raw, &artifact.metadata.schema)?;
    evaluate(&artifact.pipeline, &[(name, &x, &y)])?
        .pop()
        .ok_or_else(|| CarpriceError::ComputationError(format!("no metrics for '{}'", name)))
}
