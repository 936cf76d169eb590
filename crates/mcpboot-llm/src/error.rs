//! LLM error types.

use thiserror::Error;

/// Errors that can occur when calling an LLM provider.
#[derive(Debug, Error)]
pub enum LLMError {
    /// API-level error from the provider
    #[error("API error: {0}")]
    ApiError(String),

    /// Network/connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Response arrived but could not be decoded
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Response contained no text
    #[error("Empty response from LLM")]
    EmptyResponse,
}
