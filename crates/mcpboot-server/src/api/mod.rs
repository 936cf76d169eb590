//! API routes

pub mod health;
pub mod mcp;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(mcp::mcp_post))
        .route("/mcp", get(mcp::mcp_get))
        .route("/health", get(health::health_check))
        .with_state(state)
}
