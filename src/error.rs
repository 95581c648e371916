//! Error types for the carprice workflow

use thiserror::Error;

/// Result type alias for carprice operations
pub type Result<T> = std::result::Result<T, CarpriceError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum CarpriceError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    #[error("Search exhausted: all {n_candidates} candidates failed")]
    SearchExhausted { n_candidates: usize },
}

impl From<polars::error::PolarsError> for CarpriceError {
    fn from(err: polars::error::PolarsError) -> Self {
        CarpriceError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CarpriceError {
    fn from(err: serde_json::Error) -> Self {
        CarpriceError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for CarpriceError {
    fn from(err: bincode::Error) -> Self {
        CarpriceError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CarpriceError {
    fn from(err: ndarray::ShapeError) -> Self {
        CarpriceError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
