//! carprice CLI Module
//!
//! Command-line interface for training, prediction, and evaluation.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::WorkflowConfig;
use crate::export::load_model;
use crate::optimizer::{CandidateOutcome, SearchResult};
use crate::report::write_metrics;
use crate::utils::{DataLoader, DataSaver};
use crate::workflow::{evaluate_table, predict_table, run_training};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "carprice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Used-vehicle price regression with cross-validated feature selection")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full training workflow
    Train {
        /// JSON workflow configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Training table (CSV or gzip-compressed CSV)
        #[arg(long)]
        train: Option<PathBuf>,

        /// Test table
        #[arg(long)]
        test: Option<PathBuf>,

        /// Output model file
        #[arg(long)]
        model_out: Option<PathBuf>,

        /// Output metrics file
        #[arg(long)]
        metrics_out: Option<PathBuf>,

        /// Number of cross-validation folds
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Seed for the fold shuffle
        #[arg(long)]
        seed: Option<u64>,

        /// Worker threads (defaults to every core)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Make predictions using a trained model
    Predict {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Input data file
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions file (CSV)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score a trained model on a labelled table
    Evaluate {
        /// Trained model file
        #[arg(short, long)]
        model: PathBuf,

        /// Labelled data file
        #[arg(short, long)]
        data: PathBuf,

        /// Dataset name written in the record
        #[arg(short, long, default_value = "eval")]
        name: String,

        /// Output metrics file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Command-line overrides for a training run
#[derive(Debug, Default)]
pub struct TrainOverrides {
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub model_out: Option<PathBuf>,
    pub metrics_out: Option<PathBuf>,
    pub cv_folds: Option<usize>,
    pub seed: Option<u64>,
    pub jobs: Option<usize>,
}

impl TrainOverrides {
    /// Apply the overrides on top of a configuration
    pub fn apply(self, mut config: WorkflowConfig) -> WorkflowConfig {
        if let Some(p) = self.train { config.train_path = p; }
        if let Some(p) = self.test { config.test_path = p; }
        if let Some(p) = self.model_out { config.model_path = p; }
        if let Some(p) = self.metrics_out { config.metrics_path = p; }
        if let Some(n) = self.cv_folds { config.search.cv_folds = n; }
        if let Some(s) = self.seed { config.search.random_state = Some(s); }
        if let Some(n) = self.jobs { config.search.n_jobs = Some(n); }
        config
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(config_path: Option<&Path>, overrides: TrainOverrides) -> anyhow::Result<()> {
    section("Train");

    let base = match config_path {
        Some(path) => WorkflowConfig::from_json_file(path)?,
        None => WorkflowConfig::default(),
    };
    let config = overrides.apply(base);
    config.validate()?;

    kv("Train", &config.train_path.display().to_string());
    kv("Test", &config.test_path.display().to_string());
    kv("Folds", &config.search.cv_folds.to_string());
    kv(
        "Grid",
        &format!(
            "{} candidates ({})",
            config.search.param_grid.len(),
            config.search.scoring
        ),
    );
    println!();

    step_run("Searching");
    let start = Instant::now();
    let outcome = run_training(&config)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_candidates(&outcome.search);

    section("Metrics");
    for record in &outcome.metrics {
        println!(
            "  {:<8} {} {}  {} {}  {} {}",
            muted(&record.dataset),
            dim("r2"),
            format!("{:.4}", record.r2).white().bold(),
            dim("mse"),
            format!("{:.4}", record.mse).white(),
            dim("mad"),
            format!("{:.4}", record.mad).white(),
        );
    }
    println!();
    kv("Model", &config.model_path.display().to_string());
    kv("Metrics", &config.metrics_path.display().to_string());
    println!();

    Ok(())
}

fn print_candidates(result: &SearchResult) {
    section("Candidates");
    for candidate in &result.candidates {
        let marker = if candidate.k == result.best_k { ok("★") } else { dim("·") };
        match &candidate.outcome {
            CandidateOutcome::Scored { mean_score, std_score, .. } => {
                println!(
                    "  {} k={:<3} {} {}",
                    marker,
                    candidate.k,
                    format!("{:>12.5}", mean_score).white(),
                    dim(&format!("± {:.5}", std_score)),
                );
            }
            CandidateOutcome::Failed { reason } => {
                println!("  {} k={:<3} {} {}", marker, candidate.k, "failed".yellow(), dim(reason));
            }
        }
    }
    println!();
    kv("Best k", &result.best_k.to_string());
    kv("CV score", &format!("{:.5}", result.best_score));

    section("Selected features");
    for (name, score) in result.best_pipeline.selected_feature_scores() {
        println!("  {:<28} {}", muted(&name), format!("{:>12.3}", score).white());
    }
}

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let artifact = load_model(model_path)?;
    step_done(&format!("k = {}", artifact.metadata.best_k));

    step_run("Loading data");
    let raw = DataLoader::new().load_auto(data_path)?;
    step_done(&format!("{} rows", raw.height()));

    let mut predictions = predict_table(&artifact, &raw)?;

    match output {
        Some(path) => {
            DataSaver::save_csv(&mut predictions, path)?;
            kv("Written", &path.display().to_string());
        }
        None => {
            let values = predictions.column("prediction")?.as_materialized_series().f64()?;
            for (i, p) in values.into_no_null_iter().enumerate() {
                println!("  {:>5}  {}", dim(&i.to_string()), format!("{:.4}", p).white());
            }
        }
    }
    println!();

    Ok(())
}

pub fn cmd_evaluate(
    model_path: &Path,
    data_path: &Path,
    name: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Evaluate");

    let artifact = load_model(model_path)?;
    let raw = DataLoader::new().load_auto(data_path)?;
    let record = evaluate_table(&artifact, &raw, name)?;

    kv("R²", &format!("{:.4}", record.r2));
    kv("MSE", &format!("{:.4}", record.mse));
    kv("MAD", &format!("{:.4}", record.mad));

    if let Some(path) = output {
        write_metrics(path, std::slice::from_ref(&record))?;
        kv("Written", &path.display().to_string());
    }
    println!();

    Ok(())
}
