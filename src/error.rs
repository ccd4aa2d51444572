//! Error handling for Trackfolio
//!
//! Defines the domain error types and establishes a unified Result type
//! using anyhow for context chaining at the application boundary.

use thiserror::Error;

/// Core error types for portfolio operations
#[derive(Error, Debug)]
pub enum TrackfolioError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("import error: {0}")]
    Import(String),

    #[error("holding {0} not found")]
    HoldingNotFound(i64),

    #[error("quote generation failed: {0}")]
    Generation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application operations
pub type Result<T> = anyhow::Result<T>;
