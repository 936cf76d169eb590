//! Data model shared across the generation pipeline and the server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The text a fetched URL turned into, plus the URLs discovered inside it.
///
/// Immutable once built. `text` is the post-extraction body (HTML stripped,
/// JSON and plain text passed through), truncated to the content ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedContent {
    pub url: String,
    pub text: String,
    pub content_type: String,
    #[serde(default)]
    pub discovered_urls: Vec<String>,
}

/// The planner's intent for one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTool {
    /// Identifier matching `^[a-z][a-z0-9_]*$`, unique within a plan.
    pub name: String,
    pub description: String,
    /// JSON Schema with a root `"type": "object"`.
    pub input_schema: Value,
    #[serde(default)]
    pub endpoints_used: Vec<String>,
    pub implementation_notes: String,
    pub needs_network: bool,
}

/// The validated output of the planning phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationPlan {
    pub tools: Vec<PlannedTool>,
}

/// A planned tool enriched with its generated handler source: an async
/// function body over the free variables `args` and `fetch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    #[serde(default)]
    pub endpoints_used: Vec<String>,
    pub implementation_notes: String,
    pub needs_network: bool,
    pub handler_source: String,
}

impl CompiledTool {
    pub fn from_plan(plan: PlannedTool, handler_source: impl Into<String>) -> Self {
        Self {
            name: plan.name,
            description: plan.description,
            input_schema: plan.input_schema,
            endpoints_used: plan.endpoints_used,
            implementation_notes: plan.implementation_notes,
            needs_network: plan.needs_network,
            handler_source: handler_source.into(),
        }
    }
}

/// The full compiled tool table, in plan order, plus the whitelist domains
/// needed to reconstruct the gated fetch on a cache-only restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTools {
    pub tools: Vec<CompiledTool>,
    #[serde(default)]
    pub whitelist_domains: Vec<String>,
}

impl CompiledTools {
    pub fn new(tools: Vec<CompiledTool>, whitelist_domains: Vec<String>) -> Self {
        Self {
            tools,
            whitelist_domains,
        }
    }

    /// Look up a tool by name. Tables are small; a scan keeps plan order
    /// authoritative.
    pub fn get(&self, name: &str) -> Option<&CompiledTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// One persisted generation, keyed by prompt and content fingerprints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub prompt_fingerprint: String,
    pub content_fingerprint: String,
    pub plan: GenerationPlan,
    pub compiled_tools: Vec<CompiledTool>,
    #[serde(default)]
    pub whitelist_domains: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        prompt_fingerprint: impl Into<String>,
        content_fingerprint: impl Into<String>,
        plan: GenerationPlan,
        compiled: &CompiledTools,
    ) -> Self {
        Self {
            prompt_fingerprint: prompt_fingerprint.into(),
            content_fingerprint: content_fingerprint.into(),
            plan,
            compiled_tools: compiled.tools.clone(),
            whitelist_domains: compiled.whitelist_domains.clone(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild the runtime tool table from this entry.
    pub fn into_compiled_tools(self) -> CompiledTools {
        CompiledTools::new(self.compiled_tools, self.whitelist_domains)
    }
}

/// MCP-shaped tool call result.
///
/// `content` items are passed through to the transport verbatim; only the
/// top-level shape is ever validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Value>,
    #[serde(
        rename = "isError",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful single-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text.into() })],
            is_error: false,
        }
    }

    /// An error result with a single text message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![json!({ "type": "text", "text": text.into() })],
            is_error: true,
        }
    }

    /// The text of the first content item, if it has one.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|c| c["text"].as_str())
    }
}
