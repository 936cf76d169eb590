//! Compilation phase: LLM → validated handler source per planned tool

use std::sync::{Arc, OnceLock};

use mcpboot_core::{CompiledTool, FetchedContent, GenerationPlan, PlannedTool};
use mcpboot_llm::LLMClient;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::error::{GenError, GenResult};
use crate::{extract, prompts, MAX_ATTEMPTS};

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*import\b").unwrap())
}

fn require_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\brequire\s*\(").unwrap())
}

fn fetch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bfetch\s*\(").unwrap())
}

/// Turns each planned tool into a compiled one via a dedicated LLM call.
pub struct Compiler {
    llm: Arc<dyn LLMClient>,
}

impl Compiler {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Compile every tool in the plan, sequentially and in plan order.
    /// Sequential keeps LLM budgeting and retries deterministic.
    #[instrument(skip_all, fields(tools = plan.tools.len()))]
    pub async fn compile(
        &self,
        plan: &GenerationPlan,
        prompt: &str,
        contents: &[FetchedContent],
    ) -> GenResult<Vec<CompiledTool>> {
        let mut compiled = Vec::with_capacity(plan.tools.len());
        for tool in &plan.tools {
            compiled.push(self.compile_tool(tool, prompt, contents).await?);
        }
        Ok(compiled)
    }

    async fn compile_tool(
        &self,
        tool: &PlannedTool,
        prompt: &str,
        contents: &[FetchedContent],
    ) -> GenResult<CompiledTool> {
        let system = if tool.needs_network {
            prompts::COMPILER_SYSTEM_NETWORK
        } else {
            prompts::COMPILER_SYSTEM_PURE
        };
        let user = prompts::compile_user_prompt(tool, prompt, contents);

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let result = match self.llm.generate(system, &user).await {
                Ok(response) => validate_source(tool, &response),
                Err(e) => Err(GenError::Llm {
                    phase: format!("compiling \"{}\"", tool.name),
                    source: e,
                }),
            };
            match result {
                Ok(source) => {
                    info!(tool = %tool.name, attempt, bytes = source.len(), "handler compiled");
                    return Ok(CompiledTool::from_plan(tool.clone(), source));
                }
                Err(e) => {
                    warn!(tool = %tool.name, attempt, error = %e, "compilation attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.expect("at least one compilation attempt ran"))
    }
}

/// Extract and vet a handler body: no module loading, needsNetwork must
/// agree with the body, and the body must construct as an async function.
fn validate_source(tool: &PlannedTool, response: &str) -> GenResult<String> {
    let source = extract::extract_code(response);

    let reject = |message: &str| {
        Err(GenError::CodeValidation {
            tool: tool.name.clone(),
            message: message.to_string(),
        })
    };

    if import_regex().is_match(&source) {
        return reject("import statements are not allowed");
    }
    if require_regex().is_match(&source) {
        return reject("require() calls are not allowed");
    }
    if !tool.needs_network && fetch_regex().is_match(&source) {
        return reject("pure-computation tool references fetch");
    }

    mcpboot_sandbox::validate_handler_source(&source).map_err(|e| GenError::CodeValidation {
        tool: tool.name.clone(),
        message: e.to_string(),
    })?;

    Ok(source)
}
