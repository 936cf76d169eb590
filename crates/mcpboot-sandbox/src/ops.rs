//! Host ops registered into the handler isolate
//!
//! These three ops are the entire host surface available to generated code.

use std::cell::RefCell;
use std::rc::Rc;

use deno_core::error::AnyError;
use deno_core::{op2, OpState};
use mcpboot_core::{FetchRequestInit, GatedFetch, GatedResponse};
use tracing::debug;

/// Network capability slot. `None` for pure-computation invocations; the
/// prelude then never installs `fetch` and the op refuses anyway.
pub(crate) struct NetCapability(pub Option<GatedFetch>);

#[op2(fast)]
pub fn op_net_enabled(state: &mut OpState) -> bool {
    state.borrow::<NetCapability>().0.is_some()
}

/// `console.log` target. Diagnostics go to tracing, never to stdout: stdout
/// belongs to the pipe handoff protocol.
#[op2(fast)]
pub fn op_handler_log(#[string] message: &str) {
    debug!(target: "mcpboot::handler", "{message}");
}

#[op2(async)]
#[serde]
pub async fn op_gated_fetch(
    state: Rc<RefCell<OpState>>,
    #[string] url: String,
    #[serde] init: Option<FetchRequestInit>,
) -> Result<GatedResponse, AnyError> {
    let capability = {
        let state = state.borrow();
        state.borrow::<NetCapability>().0.clone()
    };
    let Some(gated) = capability else {
        return Err(deno_core::error::type_error(
            "Fetch blocked: no network capability granted to this tool",
        ));
    };
    gated
        .fetch(&url, init)
        .await
        .map_err(|e| deno_core::error::type_error(e.to_string()))
}
