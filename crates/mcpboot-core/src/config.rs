//! Runtime configuration types

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// LLM provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    /// Model used when `--model` is not given.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-sonnet-20241022",
            Self::OpenAI => "gpt-4o",
        }
    }

    /// Environment variable consulted when `--api-key` is not given.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            other => Err(CoreError::Config(format!(
                "Invalid provider: {other} (expected anthropic or openai)"
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// Fully resolved runtime configuration.
///
/// Produced by the CLI layer; everything downstream of `main` reads from
/// this instead of touching flags or the environment again.
#[derive(Debug, Clone)]
pub struct Config {
    /// The user's natural-language prompt (from `--prompt` or `--prompt-file`).
    pub prompt: String,
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    /// Port to listen on; 0 means pick a free port.
    pub port: u16,
    pub cache_dir: PathBuf,
    pub no_cache: bool,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    /// Stop after planning and print the plan to stdout.
    pub dry_run: bool,
}

impl Config {
    /// Resolve the API key for `provider`, falling back to its environment
    /// variable.
    pub fn resolve_api_key(provider: Provider, flag: Option<String>) -> Result<String, CoreError> {
        if let Some(key) = flag {
            return Ok(key);
        }
        std::env::var(provider.api_key_env()).map_err(|_| {
            CoreError::Config(format!(
                "No API key: pass --api-key or set {}",
                provider.api_key_env()
            ))
        })
    }
}
