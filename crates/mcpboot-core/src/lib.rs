//! mcpboot Core - shared types and startup-pipeline building blocks
//!
//! This crate provides the foundation the rest of mcpboot is built on:
//! - Tool plan and compiled-tool types (MCP-shaped results included)
//! - The URL fetcher that turns a prompt's links into LLM context
//! - The domain whitelist and the gated fetch capability
//! - The content-addressed generation cache
//! - Configuration and error types

pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod types;
pub mod whitelist;

pub use cache::{content_fingerprint, fingerprint, ToolCache};
pub use config::{Config, Provider};
pub use error::{CoreError, CoreResult};
pub use fetch::{extract_urls, Fetcher, MAX_CONTENT_CHARS};
pub use types::{
    CacheEntry, CompiledTool, CompiledTools, FetchedContent, GenerationPlan, PlannedTool,
    ToolResult,
};
pub use whitelist::{FetchRequestInit, GatedFetch, GatedResponse, Whitelist};
