//! mcpboot Server - HTTP surface and startup orchestration
//!
//! This crate provides:
//! - The MCP streamable-HTTP endpoint (`POST /mcp`, JSON or SSE framing)
//! - The health endpoint
//! - The CLI and the startup sequence (fetch → cache/generate → serve)

pub mod api;
pub mod boot;
pub mod cli;
pub mod state;

pub use api::create_router;
pub use state::AppState;
