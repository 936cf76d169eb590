//! Startup orchestration
//!
//! fetch → whitelist → fingerprints → cache or generate → serve. The cache
//! write lands before the listener opens, so a crash mid-generation never
//! leaves a partially-served state.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use mcpboot_core::{
    content_fingerprint, extract_urls, fingerprint, CacheEntry, CompiledTools, Config, Fetcher,
    GatedFetch, ToolCache, Whitelist,
};
use mcpboot_gen::{Compiler, Planner};
use mcpboot_sandbox::{Sandbox, ToolExecutor};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::create_router;
use crate::state::AppState;

/// Run the full startup sequence and serve until shutdown.
pub async fn run(config: Config) -> Result<()> {
    info!("mcpboot v{} starting", env!("CARGO_PKG_VERSION"));

    let prompt_urls = extract_urls(&config.prompt);
    info!(urls = prompt_urls.len(), "extracted prompt URLs");

    let fetcher = Fetcher::new()?;
    let contents = fetcher.fetch_all(&prompt_urls).await;

    let whitelist = Whitelist::build(&prompt_urls, &contents);
    let prompt_fp = fingerprint(&config.prompt);
    let content_fp = content_fingerprint(&contents);
    info!(%prompt_fp, %content_fp, "fingerprints computed");

    let cache = if config.no_cache {
        ToolCache::disabled()
    } else {
        ToolCache::new(&config.cache_dir)
    };

    let (tools, whitelist) = match cache.get(&prompt_fp, &content_fp) {
        Some(entry) => {
            info!(tools = entry.compiled_tools.len(), "cache hit, skipping generation");
            if config.dry_run {
                println!("{}", serde_json::to_string_pretty(&entry.plan)?);
                return Ok(());
            }
            let tools = entry.into_compiled_tools();
            let whitelist = Whitelist::from_domains(tools.whitelist_domains.clone());
            (tools, whitelist)
        }
        None => {
            let llm = mcpboot_llm::client_from_config(&config);
            info!(provider = %config.provider, model = %config.model, "planning tools");
            let plan = Planner::new(Arc::clone(&llm))
                .plan(&config.prompt, &contents, &whitelist)
                .await?;

            if config.dry_run {
                println!("{}", serde_json::to_string_pretty(&plan)?);
                return Ok(());
            }

            let compiled = Compiler::new(llm)
                .compile(&plan, &config.prompt, &contents)
                .await?;
            let tools = CompiledTools::new(compiled, whitelist.domains());
            cache.set(&CacheEntry::new(&prompt_fp, &content_fp, plan, &tools))?;
            (tools, whitelist)
        }
    };

    for tool in &tools.tools {
        info!(tool = %tool.name, needs_network = tool.needs_network, "tool ready");
    }

    let gated_fetch = GatedFetch::new(whitelist);
    let executor = Arc::new(ToolExecutor::new(tools, Sandbox::new(gated_fetch)));
    let app = build_app(AppState::new(executor));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    let port = listener.local_addr()?.port();
    let url = format!("http://localhost:{port}/mcp");
    info!(%url, "MCP server listening");

    // Pipe handoff: a downstream consumer reads the URL from stdout
    if !std::io::stdout().is_terminal() {
        println!("{url}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

fn build_app(state: AppState) -> Router {
    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
