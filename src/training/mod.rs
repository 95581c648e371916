//! Model training module
//!
//! Provides the estimator and evaluation pieces of the workflow:
//! - Ordinary least squares linear regression
//! - K-fold cross-validation splitting
//! - Regression metrics (R², MSE, MAE)

pub mod cross_validation;
pub mod linear_models;
mod metrics;

pub use cross_validation::{CrossValidator, CVStrategy, CVSplit, FoldScores};
pub use linear_models::LinearRegression;
pub use metrics::RegressionMetrics;
