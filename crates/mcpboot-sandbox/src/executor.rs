//! Tool dispatch over the compiled tool table
//!
//! The executor owns the table and shapes every failure into an MCP error
//! result; nothing a handler does can take the server loop down. There is no
//! upstream to fall back to: the generated handler *is* the implementation.

use mcpboot_core::{CompiledTools, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::runtime::Sandbox;

/// What `tools/list` reports for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Adapts a [`CompiledTools`] table to the MCP tool surface.
pub struct ToolExecutor {
    tools: CompiledTools,
    sandbox: Sandbox,
}

impl ToolExecutor {
    pub fn new(tools: CompiledTools, sandbox: Sandbox) -> Self {
        Self { tools, sandbox }
    }

    pub fn tools(&self) -> &CompiledTools {
        &self.tools
    }

    /// Tool descriptors in plan order, for `tools/list`.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.tools
            .tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    /// Execute a tool by name. Never returns an error: failures become
    /// `isError` tool results for the MCP caller.
    pub async fn execute(&self, name: &str, args: &Value) -> ToolResult {
        let Some(tool) = self.tools.get(name) else {
            return ToolResult::error(format!("Unknown tool: {name}"));
        };

        debug!(tool = name, needs_network = tool.needs_network, "executing tool");
        match self
            .sandbox
            .run_handler(&tool.handler_source, args, tool.needs_network)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "handler failed");
                ToolResult::error(format!("Handler error: {e}"))
            }
        }
    }
}
