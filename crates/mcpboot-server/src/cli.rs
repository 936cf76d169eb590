//! Command-line interface

use std::path::PathBuf;
use std::process::exit;

use clap::error::ErrorKind;
use clap::{ArgGroup, Parser};
use mcpboot_core::{Config, CoreError, CoreResult, Provider};

/// Synthesize a working MCP tool server from a natural-language prompt.
#[derive(Debug, Parser)]
#[command(name = "mcpboot", version, about)]
#[command(group = ArgGroup::new("prompt_source").required(true))]
pub struct Cli {
    /// Natural-language prompt describing the tools to generate
    #[arg(long, group = "prompt_source", value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Read the prompt from a file instead
    #[arg(long, group = "prompt_source", value_name = "PATH")]
    pub prompt_file: Option<PathBuf>,

    /// LLM provider: anthropic or openai
    #[arg(long, default_value = "anthropic")]
    pub provider: String,

    /// Model id (defaults to the provider's standard model)
    #[arg(long)]
    pub model: Option<String>,

    /// API key (falls back to ANTHROPIC_API_KEY / OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Port to listen on; 0 picks a free port
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Directory for cached generations
    #[arg(long, default_value = ".mcpboot-cache")]
    pub cache_dir: PathBuf,

    /// Skip cache reads and writes
    #[arg(long)]
    pub no_cache: bool,

    /// Debug-level logging
    #[arg(long)]
    pub verbose: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print the generated plan to stdout and exit without compiling
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse argv. Help and version exit 0; any usage error exits 1 with a
    /// one-line message, matching the rest of the fatal-error contract.
    pub fn parse_or_exit() -> Self {
        match Self::try_parse() {
            Ok(cli) => cli,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                print!("{e}");
                exit(0);
            }
            Err(e) => {
                eprintln!("{e}");
                exit(1);
            }
        }
    }

    /// Resolve flags and environment into a runtime [`Config`].
    pub fn into_config(self) -> CoreResult<Config> {
        let prompt = match (self.prompt, self.prompt_file) {
            (Some(text), None) => text,
            (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
                CoreError::Config(format!("Cannot read prompt file {}: {e}", path.display()))
            })?,
            // clap's ArgGroup guarantees exactly one source
            _ => return Err(CoreError::Config("No prompt given".to_string())),
        };
        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(CoreError::Config("Prompt is empty".to_string()));
        }

        let provider: Provider = self.provider.parse()?;
        let model = self
            .model
            .unwrap_or_else(|| provider.default_model().to_string());
        let api_key = Config::resolve_api_key(provider, self.api_key)?;

        Ok(Config {
            prompt,
            provider,
            model,
            api_key,
            port: self.port,
            cache_dir: self.cache_dir,
            no_cache: self.no_cache,
            verbose: self.verbose,
            log_file: self.log_file,
            dry_run: self.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("mcpboot").chain(args.iter().copied()))
    }

    #[test]
    fn test_prompt_and_prompt_file_are_mutually_exclusive() {
        assert!(parse(&["--prompt", "x", "--prompt-file", "y"]).is_err());
        assert!(parse(&[]).is_err());
        assert!(parse(&["--prompt", "make a calculator"]).is_ok());
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--prompt", "x"]).unwrap();
        assert_eq!(cli.provider, "anthropic");
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.cache_dir, PathBuf::from(".mcpboot-cache"));
        assert!(!cli.no_cache);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_invalid_provider_is_a_config_error() {
        let cli = parse(&["--prompt", "x", "--provider", "gemini", "--api-key", "k"]).unwrap();
        let err = cli.into_config().unwrap_err();
        assert!(err.to_string().contains("Invalid provider"), "{err}");
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let cli = parse(&["--prompt", "x", "--api-key", "sk-test"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, Provider::Anthropic.default_model());
    }
}
