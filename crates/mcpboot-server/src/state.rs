//! Application state

use std::sync::Arc;

use mcpboot_sandbox::ToolExecutor;

/// Shared server state. The executor's tool table is read-only after
/// startup, so handlers clone freely.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<ToolExecutor>,
    /// Session id attached to MCP responses, minted once per process.
    pub session_id: String,
}

impl AppState {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self {
            executor,
            session_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}
