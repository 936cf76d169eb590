//! MCP streamable-HTTP endpoint
//!
//! JSON-RPC 2.0 over POST to a single path. Responses are plain JSON unless
//! the client's Accept header asks exclusively for an event stream, in which
//! case the same payload goes out as one SSE frame.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mcpboot_core::ToolResult;
use serde_json::{json, Value};
use tracing::debug;

use crate::state::AppState;

const PROTOCOL_VERSION: &str = "2025-03-26";

/// Callable but never listed: lets downstream stages introspect the
/// bootstrapped server without reading the cache directory.
const METADATA_TOOL: &str = "_mcp_metadata";

/// POST /mcp
pub async fn mcp_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Ok(request) = serde_json::from_str::<Value>(&body) else {
        return render(
            error_payload(Value::Null, -32700, "Parse error"),
            &headers,
            &state,
        );
    };

    // Notifications carry no id and get no body
    if request.get("id").map_or(true, Value::is_null) {
        debug!(
            method = request["method"].as_str().unwrap_or(""),
            "notification acknowledged"
        );
        return StatusCode::ACCEPTED.into_response();
    }

    let payload = handle_request(&state, &request).await;
    render(payload, &headers, &state)
}

/// GET /mcp - this transport only serves request/response over POST.
pub async fn mcp_get() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "jsonrpc": "2.0",
            "error": {"code": -32000, "message": "Use POST for MCP requests"},
            "id": null
        })),
    )
        .into_response()
}

async fn handle_request(state: &AppState, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request["method"].as_str().unwrap_or("");

    match method {
        "initialize" => {
            debug!(
                client_version = request["params"]["protocolVersion"].as_str().unwrap_or("?"),
                "initialize"
            );
            result_payload(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {
                        "name": "mcpboot",
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            )
        }
        "tools/list" => result_payload(id, json!({"tools": state.executor.list_tools()})),
        "tools/call" => {
            let name = request["params"]["name"].as_str().unwrap_or("");
            let mut args = request["params"]["arguments"].clone();
            if args.is_null() {
                args = json!({});
            }

            let result = if name == METADATA_TOOL {
                metadata_result(state)
            } else {
                state.executor.execute(name, &args).await
            };

            match serde_json::to_value(&result) {
                Ok(value) => result_payload(id, value),
                Err(e) => error_payload(id, -32603, &format!("Internal error: {e}")),
            }
        }
        other => error_payload(id, -32601, &format!("Method not found: {other}")),
    }
}

fn metadata_result(state: &AppState) -> ToolResult {
    let tools = state.executor.tools();
    let blob = json!({
        "stage": "boot",
        "version": env!("CARGO_PKG_VERSION"),
        "whitelistDomains": tools.whitelist_domains,
        "tools": tools.tools.iter().map(|t| json!({
            "name": t.name,
            "description": t.description,
            "handlerSource": t.handler_source,
        })).collect::<Vec<_>>(),
    });
    match serde_json::to_string_pretty(&blob) {
        Ok(text) => ToolResult::text(text),
        Err(e) => ToolResult::error(format!("metadata serialization failed: {e}")),
    }
}

fn result_payload(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "result": result, "id": id})
}

fn error_payload(id: Value, code: i64, message: &str) -> Value {
    json!({"jsonrpc": "2.0", "error": {"code": code, "message": message}, "id": id})
}

/// Clients that accept only `text/event-stream` get the payload as a single
/// SSE frame; everyone else gets plain JSON.
fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|accept| accept.contains("text/event-stream") && !accept.contains("application/json"))
        .unwrap_or(false)
}

fn render(payload: Value, headers: &HeaderMap, state: &AppState) -> Response {
    let body = payload.to_string();
    let mut response = if wants_event_stream(headers) {
        (
            [(header::CONTENT_TYPE, "text/event-stream")],
            format!("event: message\ndata: {body}\n\n"),
        )
            .into_response()
    } else {
        ([(header::CONTENT_TYPE, "application/json")], body).into_response()
    };

    if let Ok(value) = HeaderValue::from_str(&state.session_id) {
        response.headers_mut().insert("mcp-session-id", value);
    }
    response
}
