//! Core error types

use thiserror::Error;

/// Main error type for the core pipeline
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// The gated fetch refused a request. The message wording is part of the
    /// contract surfaced to generated handlers and their users.
    #[error("Fetch blocked: {0}")]
    FetchBlocked(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
