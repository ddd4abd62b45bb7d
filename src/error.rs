//! Error types shared across the pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError::MarketData(e.to_string())
    }
}

impl From<tokio_postgres::Error> for PipelineError {
    fn from(e: tokio_postgres::Error) -> Self {
        PipelineError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Storage(format!("serialization failed: {}", e))
    }
}
