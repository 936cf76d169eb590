//! mcpboot - synthesize a working MCP tool server from a prompt
//!
//! Two LLM calls' worth of startup (plan, then one handler per tool), no LLM
//! in the request path, and a content-addressed cache so the expensive part
//! happens once per (prompt, content) pair.

use std::process::ExitCode;
use std::sync::Arc;

use mcpboot_core::Config;
use mcpboot_server::{boot, cli::Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_or_exit();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match boot::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr (or `--log-file`); stdout stays clean for the pipe
/// handoff and dry-run plan output.
fn init_logging(config: &Config) -> Result<(), String> {
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    match &config.log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| format!("Cannot open log file {}: {e}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}
