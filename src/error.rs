use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Series contains {0} missing or non-finite values")]
    NonFiniteValues(usize),

    #[error("Invalid seasonal period {0}: must be at least 2")]
    InvalidPeriod(usize),

    #[error("Invalid period string: {0}")]
    InvalidPeriodString(String),

    #[error("Invalid configuration for {field}: {details}")]
    InvalidConfig { field: String, details: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
