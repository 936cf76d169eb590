//! # mcpboot-llm
//!
//! LLM client adapters for the mcpboot generation pipeline.
//!
//! The pipeline only ever needs one call shape: a system prompt and a user
//! prompt in, completion text out. Retries, JSON extraction and validation
//! all live upstream in the planner and compiler; this crate is a thin
//! transport over each provider's messages API.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mcpboot_llm::{AnthropicClient, LLMClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnthropicClient::new("sk-ant-...", "claude-3-5-sonnet-20241022");
//!     let text = client.generate("You emit JSON.", "Plan three tools.").await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

mod anthropic;
mod error;
mod openai;

use async_trait::async_trait;
use mcpboot_core::{Config, Provider};
use std::sync::Arc;

pub use anthropic::AnthropicClient;
pub use error::LLMError;
pub use openai::OpenAIClient;

/// Two-string generation contract the planner and compiler consume.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Provider name (e.g. "anthropic", "openai").
    fn provider(&self) -> &str;

    /// Model id being used.
    fn model(&self) -> &str;

    /// Generate a completion for `system` + `user`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport or API failure; there are no retries at
    /// this layer.
    async fn generate(&self, system: &str, user: &str) -> Result<String, LLMError>;
}

/// Build the configured provider's client.
pub fn client_from_config(config: &Config) -> Arc<dyn LLMClient> {
    match config.provider {
        Provider::Anthropic => Arc::new(AnthropicClient::new(&config.api_key, &config.model)),
        Provider::OpenAI => Arc::new(OpenAIClient::new(&config.api_key, &config.model)),
    }
}
