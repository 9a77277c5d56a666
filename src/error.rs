//! Error types for the research pipeline

use thiserror::Error;

/// Main error type for the research pipeline
#[derive(Error, Debug)]
pub enum ResearchError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Storage errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Data errors
    #[error("Invalid data: {0}")]
    InvalidData(String),

    // Modelling errors
    #[error("Model error: {0}")]
    Model(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

pub type Result<T> = std::result::Result<T, ResearchError>;
