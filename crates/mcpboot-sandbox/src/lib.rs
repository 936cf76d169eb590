//! # mcpboot-sandbox
//!
//! Executes LLM-generated handler source in a V8 isolate with no filesystem,
//! environment, or module access. The only bridge to the host is a pair of
//! registered ops: a whitelist-gated fetch and a diagnostic log channel.
//!
//! ## Security model
//!
//! - **Fresh isolate per invocation**: no state leaks between tool calls
//! - **Capabilities by omission**: the environment exposes only the curated
//!   allow-list of globals; everything else simply does not exist
//! - **Gated fetch**: the single side-effecting primitive checks the domain
//!   whitelist before any socket work
//! - **Deadline enforcement**: a watchdog terminates synchronous spin, an
//!   outer timeout bounds the async path
//! - **Cloned arguments**: args enter the isolate as a JSON literal, so
//!   in-sandbox mutation cannot reach the executor

mod error;
mod executor;
mod ops;
mod runtime;

pub use error::{SandboxError, SandboxResult};
pub use executor::{ToolDescriptor, ToolExecutor};
pub use runtime::{validate_handler_source, Sandbox};
