//! Prompt construction for the planning and compilation phases

use mcpboot_core::{FetchedContent, PlannedTool, Whitelist};

pub const PLANNER_SYSTEM: &str = r#"You are the planning stage of an MCP (Model Context Protocol) server generator. Given a user's request and any fetched reference documents, design the set of tools the server should expose.

Respond with ONLY a JSON object, no prose before or after, in exactly this shape:

{
  "tools": [
    {
      "name": "snake_case_identifier",
      "description": "What the tool does, written for the tool's caller.",
      "inputSchema": {"type": "object", "properties": {...}, "required": [...]},
      "endpointsUsed": ["https://full.endpoint.urls/the/handler/will/call"],
      "implementationNotes": "Concrete guidance for implementing the handler: endpoints, response fields, edge cases.",
      "needsNetwork": true
    }
  ]
}

Rules:
- Tool names match ^[a-z][a-z0-9_]*$ and are unique within the plan.
- Every inputSchema is a JSON Schema with root "type": "object".
- Set needsNetwork to true only when the handler must call an HTTP API; pure computation gets needsNetwork false and an empty endpointsUsed.
- Only use endpoints on the allowed domains listed in the request. If no domains are allowed, every tool must be pure computation.
- Prefer a few well-scoped tools over many overlapping ones."#;

pub const COMPILER_SYSTEM_NETWORK: &str = r#"You implement one MCP tool handler as the BODY of a JavaScript async function. Two free variables are in scope:

- args: the tool's arguments, already matching its input schema
- fetch(url, init): HTTP client restricted to whitelisted domains. Returns a response with status, ok, statusText, headers.get(name), text() and json(). A request to a non-whitelisted domain rejects with an explanatory error.

Available globals: JSON, Math, String, Number, Boolean, Array, Object, Map, Set, Date, RegExp, parseInt, parseFloat, isNaN, isFinite, structuredClone, Promise, URL, URLSearchParams, TextEncoder, TextDecoder, Headers, Response, console.log. There is no module system: import and require do not exist. There are no timers and no filesystem.

The body must return an MCP tool result:
  {content: [{type: "text", text: "..."}]}
and on failure:
  {content: [{type: "text", text: "what went wrong"}], isError: true}

Wrap fallible work in try/catch and return the error shape instead of throwing.

Respond with ONLY the function body inside a ```javascript code fence. Do not write the function signature or any prose."#;

pub const COMPILER_SYSTEM_PURE: &str = r#"You implement one MCP tool handler as the BODY of a JavaScript async function. One free variable is in scope:

- args: the tool's arguments, already matching its input schema

This tool is pure computation. There is NO network access: fetch is not available and must not be referenced.

Available globals: JSON, Math, String, Number, Boolean, Array, Object, Map, Set, Date, RegExp, parseInt, parseFloat, isNaN, isFinite, structuredClone, Promise, URL, URLSearchParams, TextEncoder, TextDecoder. There is no module system: import and require do not exist. There are no timers and no filesystem.

The body must return an MCP tool result:
  {content: [{type: "text", text: "..."}]}
and on failure:
  {content: [{type: "text", text: "what went wrong"}], isError: true}

Wrap fallible work in try/catch and return the error shape instead of throwing.

Respond with ONLY the function body inside a ```javascript code fence. Do not write the function signature or any prose."#;

/// Assemble the planner's user prompt: request, labeled documents, allowed
/// domains.
pub fn plan_user_prompt(
    prompt: &str,
    contents: &[FetchedContent],
    whitelist: &Whitelist,
) -> String {
    let mut out = format!("## Request\n\n{prompt}\n");

    if !contents.is_empty() {
        out.push_str("\n## Reference documents\n");
        for content in contents {
            out.push_str(&format!("\n### {}\n\n{}\n", content.url, content.text));
        }
    }

    out.push_str("\n## Allowed domains\n\n");
    if whitelist.is_empty() {
        out.push_str("none — emit only pure-computation tools\n");
    } else {
        for domain in whitelist.domains() {
            out.push_str(&format!("- {domain}\n"));
        }
    }
    out
}

/// Assemble the compiler's user prompt for one tool: its plan record, the
/// original request for context, and the documents for endpoint details.
pub fn compile_user_prompt(
    tool: &PlannedTool,
    prompt: &str,
    contents: &[FetchedContent],
) -> String {
    let plan_json = serde_json::to_string_pretty(tool).unwrap_or_default();
    let mut out = format!(
        "## Tool to implement\n\n{plan_json}\n\n## Original request (context)\n\n{prompt}\n"
    );

    if !contents.is_empty() {
        out.push_str("\n## Reference documents\n");
        for content in contents {
            out.push_str(&format!("\n### {}\n\n{}\n", content.url, content.text));
        }
    }
    out
}
