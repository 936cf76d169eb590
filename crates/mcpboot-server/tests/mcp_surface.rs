//! Integration tests for the MCP HTTP surface.
//!
//! These drive the real router with hand-built compiled tools; no LLM and no
//! network are involved.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mcpboot_core::{CompiledTool, CompiledTools, GatedFetch, PlannedTool, Whitelist};
use mcpboot_sandbox::{Sandbox, ToolExecutor};
use mcpboot_server::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn planned(name: &str, description: &str) -> PlannedTool {
    PlannedTool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        }),
        endpoints_used: vec![],
        implementation_notes: "arithmetic".to_string(),
        needs_network: false,
    }
}

fn calculator_tools() -> CompiledTools {
    CompiledTools::new(
        vec![
            CompiledTool::from_plan(
                planned("add_numbers", "Add two numbers"),
                "return {content: [{type: 'text', text: String(args.a + args.b)}]};",
            ),
            CompiledTool::from_plan(
                planned("multiply_numbers", "Multiply two numbers"),
                "return {content: [{type: 'text', text: String(args.a * args.b)}]};",
            ),
        ],
        vec!["example.com".to_string()],
    )
}

fn test_app() -> Router {
    let sandbox = Sandbox::new(GatedFetch::new(Whitelist::default()));
    let executor = Arc::new(ToolExecutor::new(calculator_tools(), sandbox));
    create_router(AppState::new(executor))
}

async fn post_mcp(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(json!({}));
    (status, body)
}

fn rpc(method: &str, params: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params})
}

#[tokio::test]
async fn test_initialize_handshake() {
    let (status, body) = post_mcp(
        test_app(),
        rpc("initialize", json!({"protocolVersion": "2025-03-26", "capabilities": {}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(body["result"]["serverInfo"]["name"], "mcpboot");
    assert!(body["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn test_tools_list_reports_visible_tools_only() {
    let (status, body) = post_mcp(test_app(), rpc("tools/list", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    let tools = body["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["add_numbers", "multiply_numbers"]);
    assert_eq!(tools[0]["description"], "Add two numbers");
    assert_eq!(tools[0]["inputSchema"]["type"], "object");
}

#[tokio::test]
async fn test_tools_call_returns_executor_result() {
    let (status, body) = post_mcp(
        test_app(),
        rpc("tools/call", json!({"name": "add_numbers", "arguments": {"a": 17, "b": 25}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["content"][0]["text"], "42");
    assert!(body["result"].get("isError").is_none());
}

#[tokio::test]
async fn test_tools_call_unknown_tool_is_error_result() {
    let (_, body) = post_mcp(
        test_app(),
        rpc("tools/call", json!({"name": "divide_numbers", "arguments": {}})),
    )
    .await;

    assert_eq!(body["result"]["isError"], true);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Unknown tool"), "{text}");
}

#[tokio::test]
async fn test_hidden_metadata_tool_is_callable_but_unlisted() {
    let (_, listed) = post_mcp(test_app(), rpc("tools/list", json!({}))).await;
    let names: Vec<&str> = listed["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(!names.contains(&"_mcp_metadata"));

    let (_, body) = post_mcp(
        test_app(),
        rpc("tools/call", json!({"name": "_mcp_metadata", "arguments": {}})),
    )
    .await;
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    let metadata: Value = serde_json::from_str(text).unwrap();
    assert_eq!(metadata["stage"], "boot");
    assert_eq!(metadata["whitelistDomains"][0], "example.com");
    assert!(metadata["tools"][0]["handlerSource"]
        .as_str()
        .unwrap()
        .contains("args.a"));
}

#[tokio::test]
async fn test_unknown_method_is_method_not_found() {
    let (_, body) = post_mcp(test_app(), rpc("resources/list", json!({}))).await;
    assert_eq!(body["error"]["code"], -32601);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("resources/list"));
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        ))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_event_stream_framing_when_client_asks_for_it() {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header("content-type", "application/json")
        .header("accept", "text/event-stream")
        .body(Body::from(rpc("tools/list", json!({})).to_string()))
        .unwrap();

    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("event: message\ndata: "), "{text}");

    let data = text
        .trim_start_matches("event: message\ndata: ")
        .trim_end();
    let body: Value = serde_json::from_str(data).unwrap();
    assert!(body["result"]["tools"].is_array());
}

#[tokio::test]
async fn test_get_mcp_is_method_not_allowed() {
    let request = Request::builder()
        .method("GET")
        .uri("/mcp")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_health_reports_tool_count() {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tools"], 2);
}
