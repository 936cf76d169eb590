//! Sandbox error types

use thiserror::Error;

/// Errors surfaced by handler validation and execution.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The handler body failed the AsyncFunction construction check.
    #[error("Syntax error in handler: {0}")]
    Syntax(String),

    /// The isolate or its prelude could not be set up.
    #[error("Sandbox setup failed: {0}")]
    Setup(String),

    /// The handler threw (or failed to compile) at invocation time. The
    /// message is the JS diagnostic.
    #[error("{0}")]
    Execution(String),

    /// The invocation exceeded the wall-clock deadline.
    #[error("Handler execution timed out")]
    Timeout,

    /// The handler returned something other than an object with an array
    /// `content`. Message wording is contract.
    #[error("Handler must return {{content: [...]}}")]
    ResultShape,

    #[error("Internal sandbox error: {0}")]
    Internal(String),
}

/// Result type alias for sandbox operations
pub type SandboxResult<T> = Result<T, SandboxError>;
