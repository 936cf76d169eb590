//! Generation error types

use mcpboot_llm::LLMError;
use thiserror::Error;

/// Errors from the planning and compilation phases. All of these are
/// startup-fatal once the retry budget is spent.
#[derive(Debug, Error)]
pub enum GenError {
    /// Transport failure from the LLM client, tagged with the phase
    /// ("planning") or the tool being compiled.
    #[error("LLM error during {phase}: {source}")]
    Llm {
        phase: String,
        #[source]
        source: LLMError,
    },

    #[error("Plan validation failed: {0}")]
    PlanValidation(String),

    #[error("Code validation failed for tool \"{tool}\": {message}")]
    CodeValidation { tool: String, message: String },
}

/// Result type alias for generation operations
pub type GenResult<T> = Result<T, GenError>;
