//! carprice - Used-vehicle price regression
//!
//! This crate fits a linear price model behind a cross-validated search over
//! the number of selected features:
//! - Feature derivation (vehicle age) and incomplete-row removal
//! - One-hot encoding and min-max scaling
//! - Univariate K-best feature selection
//! - Ordinary least squares regression
//! - Parallel grid search with k-fold cross-validation
//! - Compressed model persistence and metrics reporting
//!
//! # Modules
//!
//! ## Core ML Modules
//! - [`preprocessing`] - Column transformer, encoder, scaler, selector
//! - [`training`] - Linear regression, cross-validation, metrics
//! - [`pipeline`] - Transformer → selector → estimator chain
//! - [`optimizer`] - Grid search over K
//!
//! ## Workflow
//! - [`dataset`] - Feature derivation from the raw tables
//! - [`config`] - Caller-owned run configuration
//! - [`export`] - Model persistence
//! - [`report`] - Metrics records
//! - [`workflow`] - End-to-end training run
//!
//! ## Services
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod pipeline;
pub mod optimizer;

// Workflow
pub mod config;
pub mod dataset;
pub mod export;
pub mod report;
pub mod workflow;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{CarpriceError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{CarpriceError, Result};

    // Preprocessing
    pub use crate::preprocessing::{
        ColumnTransformer, FeatureSelector, HandleUnknown, MinMaxScaler, OneHotEncoder, Remainder,
    };

    // Training
    pub use crate::training::{CrossValidator, CVStrategy, LinearRegression, RegressionMetrics};

    // Pipeline and search
    pub use crate::pipeline::{FittedPipeline, PipelineSpec};
    pub use crate::optimizer::{
        CandidateOutcome, CandidateResult, GridSearchCV, Scoring, SearchConfig, SearchResult,
        SearchState,
    };

    // Workflow
    pub use crate::config::WorkflowConfig;
    pub use crate::dataset::{derive_features, inference_frame, DatasetSchema};
    pub use crate::export::{load_model, save_model, ArtifactMetadata, ModelArtifact};
    pub use crate::report::{evaluate, write_metrics, MetricsRecord};
    pub use crate::workflow::{
        evaluate_table, predict_table, run_training, train_on_frames, WorkflowOutcome,
    };
    pub use crate::utils::DataLoader;
}
