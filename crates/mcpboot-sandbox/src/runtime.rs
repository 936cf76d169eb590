//! Isolate construction and handler invocation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use deno_core::{serde_v8, v8, JsRuntime, PollEventLoopOptions, RuntimeOptions};
use mcpboot_core::{GatedFetch, ToolResult};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{SandboxError, SandboxResult};
use crate::ops::{self, NetCapability};

/// Environment setup executed before every handler (see `prelude.js`).
const PRELUDE: &str = include_str!("prelude.js");

/// Wall-clock deadline per invocation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

deno_core::extension!(
    mcpboot_ext,
    ops = [ops::op_net_enabled, ops::op_handler_log, ops::op_gated_fetch],
);

/// Executes handler source with a gated fetch capability and a restricted
/// global environment. A fresh isolate is built for every invocation.
#[derive(Clone)]
pub struct Sandbox {
    gated_fetch: GatedFetch,
    timeout: Duration,
}

impl Sandbox {
    pub fn new(gated_fetch: GatedFetch) -> Self {
        Self {
            gated_fetch,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-invocation deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a handler body with `args`.
    ///
    /// The isolate lives on a blocking thread with its own current-thread
    /// runtime; `JsRuntime` is not `Send` and must stay off the server
    /// executor.
    ///
    /// # Errors
    ///
    /// Compile failures, runtime exceptions, timeouts and result-shape
    /// violations all surface here; the caller shapes them into MCP error
    /// results.
    #[instrument(skip(self, source, args))]
    pub async fn run_handler(
        &self,
        source: &str,
        args: &Value,
        needs_network: bool,
    ) -> SandboxResult<ToolResult> {
        let source = source.to_string();
        let args = args.clone();
        let net = needs_network.then(|| self.gated_fetch.clone());
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| SandboxError::Internal(e.to_string()))?;
            rt.block_on(run_in_isolate(&source, &args, net, timeout))
        })
        .await
        .map_err(|e| SandboxError::Internal(e.to_string()))?
    }
}

/// Check that `source` is a valid async function body by attempting to
/// construct (not call) `async function(args, fetch) { source }` in a scratch
/// isolate. Returns the V8 diagnostic on failure.
pub fn validate_handler_source(source: &str) -> SandboxResult<()> {
    let mut runtime = JsRuntime::new(RuntimeOptions::default());
    let literal = source_literal(source)?;
    let script = format!(
        "new (Object.getPrototypeOf(async function () {{}}).constructor)(\
         \"args\", \"fetch\", {literal}); undefined"
    );
    runtime
        .execute_script("mcpboot:syntax_check", script)
        .map(|_| ())
        .map_err(|e| SandboxError::Syntax(e.to_string()))
}

async fn run_in_isolate(
    source: &str,
    args: &Value,
    net: Option<GatedFetch>,
    timeout: Duration,
) -> SandboxResult<ToolResult> {
    let mut runtime = JsRuntime::new(RuntimeOptions {
        extensions: vec![mcpboot_ext::init_ops()],
        ..Default::default()
    });
    runtime.op_state().borrow_mut().put(NetCapability(net));

    runtime
        .execute_script("mcpboot:prelude", PRELUDE)
        .map_err(|e| SandboxError::Setup(e.to_string()))?;

    let script = invocation_script(source, args)?;

    // Watchdog thread for synchronous spin: terminate_execution is the only
    // way to interrupt JS that never yields.
    let timed_out = Arc::new(AtomicBool::new(false));
    let isolate_handle = runtime.v8_isolate().thread_safe_handle();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let watchdog_flag = Arc::clone(&timed_out);
    let watchdog = std::thread::spawn(move || {
        if done_rx.recv_timeout(timeout).is_err() {
            watchdog_flag.store(true, Ordering::SeqCst);
            isolate_handle.terminate_execution();
        }
    });

    let outcome = run_script(&mut runtime, script, timeout).await;

    let _ = done_tx.send(());
    let _ = watchdog.join();

    match outcome {
        Err(_) if timed_out.load(Ordering::SeqCst) => Err(SandboxError::Timeout),
        other => other,
    }
}

async fn run_script(
    runtime: &mut JsRuntime,
    script: String,
    timeout: Duration,
) -> SandboxResult<ToolResult> {
    let promise = runtime
        .execute_script("mcpboot:handler", script)
        .map_err(|e| SandboxError::Execution(e.to_string()))?;

    let resolved = runtime.resolve(promise);
    let global = tokio::time::timeout(
        timeout,
        runtime.with_event_loop_promise(resolved, PollEventLoopOptions::default()),
    )
    .await
    .map_err(|_| SandboxError::Timeout)?
    .map_err(|e| SandboxError::Execution(e.to_string()))?;

    let value: Value = {
        let scope = &mut runtime.handle_scope();
        let local = v8::Local::new(scope, global);
        serde_v8::from_v8(scope, local).map_err(|e| {
            SandboxError::Execution(format!("handler returned an unserializable value: {e}"))
        })?
    };

    debug!(result_kind = ?value_kind(&value), "handler returned");
    validate_result_shape(value)
}

/// Build the per-invocation script. The handler body and args both enter as
/// JSON string literals: the body so V8 reports its own syntax errors, the
/// args so the sandbox works on a deep copy by construction.
fn invocation_script(source: &str, args: &Value) -> SandboxResult<String> {
    let body = source_literal(source)?;
    let args_json = serde_json::to_string(args)
        .map_err(|e| SandboxError::Internal(format!("args serialization: {e}")))?;
    let args_literal = source_literal(&args_json)?;
    Ok(format!(
        r#"(() => {{
  const AsyncFunction = Object.getPrototypeOf(async function () {{}}).constructor;
  const handler = new AsyncFunction("args", "fetch", {body});
  return handler(JSON.parse({args_literal}), globalThis.fetch);
}})()"#
    ))
}

fn source_literal(text: &str) -> SandboxResult<String> {
    serde_json::to_string(text)
        .map_err(|e| SandboxError::Internal(format!("source serialization: {e}")))
}

fn validate_result_shape(value: Value) -> SandboxResult<ToolResult> {
    let shape_ok = value
        .as_object()
        .and_then(|o| o.get("content"))
        .map(Value::is_array)
        .unwrap_or(false);
    if !shape_ok {
        return Err(SandboxError::ResultShape);
    }
    serde_json::from_value(value).map_err(|e| SandboxError::Internal(e.to_string()))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
