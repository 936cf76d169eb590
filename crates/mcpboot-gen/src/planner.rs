//! Planning phase: LLM → validated GenerationPlan

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use mcpboot_core::{extract_urls, FetchedContent, GenerationPlan, Whitelist};
use mcpboot_llm::LLMClient;
use regex::Regex;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::error::{GenError, GenResult};
use crate::{extract, prompts, MAX_ATTEMPTS};

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap())
}

/// Produces the tool plan for a prompt and its fetched documents.
pub struct Planner {
    llm: Arc<dyn LLMClient>,
}

impl Planner {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Run the planning phase. A failed attempt (transport, parse or
    /// validation) is retried once with the same prompts, then propagated.
    #[instrument(skip_all, fields(documents = contents.len()))]
    pub async fn plan(
        &self,
        prompt: &str,
        contents: &[FetchedContent],
        whitelist: &Whitelist,
    ) -> GenResult<GenerationPlan> {
        let user = prompts::plan_user_prompt(prompt, contents, whitelist);

        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let result = match self.llm.generate(prompts::PLANNER_SYSTEM, &user).await {
                Ok(response) => parse_and_validate(&response, whitelist),
                Err(e) => Err(GenError::Llm {
                    phase: "planning".to_string(),
                    source: e,
                }),
            };
            match result {
                Ok(plan) => {
                    info!(attempt, tools = plan.tools.len(), "plan accepted");
                    return Ok(plan);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "planning attempt failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.expect("at least one planning attempt ran"))
    }
}

fn parse_and_validate(response: &str, whitelist: &Whitelist) -> GenResult<GenerationPlan> {
    let json_text = extract::extract_json(response);
    let value: Value = serde_json::from_str(&json_text)
        .map_err(|e| GenError::PlanValidation(format!("plan is not valid JSON: {e}")))?;

    validate_structure(&value)?;
    validate_whitelist(&value, whitelist)?;

    serde_json::from_value(value).map_err(|e| GenError::PlanValidation(e.to_string()))
}

fn validate_structure(plan: &Value) -> GenResult<()> {
    let tools = plan
        .get("tools")
        .and_then(Value::as_array)
        .ok_or_else(|| GenError::PlanValidation("plan has no \"tools\" array".to_string()))?;
    if tools.is_empty() {
        return Err(GenError::PlanValidation(
            "plan has an empty \"tools\" array".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for tool in tools {
        let name = tool.get("name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() || !identifier_regex().is_match(name) {
            return Err(GenError::PlanValidation(format!(
                "tool name {name:?} does not match ^[a-z][a-z0-9_]*$"
            )));
        }
        if !seen.insert(name.to_string()) {
            return Err(GenError::PlanValidation(format!(
                "duplicate tool name \"{name}\""
            )));
        }

        for field in ["description", "implementationNotes"] {
            let ok = tool
                .get(field)
                .and_then(Value::as_str)
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if !ok {
                return Err(GenError::PlanValidation(format!(
                    "tool \"{name}\" has a missing or empty \"{field}\""
                )));
            }
        }

        let schema = tool.get("inputSchema").unwrap_or(&Value::Null);
        let schema_ok = schema.is_object()
            && schema.get("type").and_then(Value::as_str) == Some("object");
        if !schema_ok {
            return Err(GenError::PlanValidation(format!(
                "tool \"{name}\" needs an \"inputSchema\" with root type \"object\""
            )));
        }

        if !tool.get("needsNetwork").map(Value::is_boolean).unwrap_or(false) {
            return Err(GenError::PlanValidation(format!(
                "tool \"{name}\" has a non-boolean \"needsNetwork\""
            )));
        }
        if !tool.get("endpointsUsed").map(Value::is_array).unwrap_or(false) {
            return Err(GenError::PlanValidation(format!(
                "tool \"{name}\" has a non-array \"endpointsUsed\""
            )));
        }
    }
    Ok(())
}

/// Every URL embedded in a network tool's endpoints must satisfy the
/// whitelist; a plan that reaches beyond it would only produce handlers
/// whose every fetch fails.
fn validate_whitelist(plan: &Value, whitelist: &Whitelist) -> GenResult<()> {
    let Some(tools) = plan.get("tools").and_then(Value::as_array) else {
        return Ok(());
    };
    for tool in tools {
        if tool.get("needsNetwork").and_then(Value::as_bool) != Some(true) {
            continue;
        }
        let name = tool.get("name").and_then(Value::as_str).unwrap_or("?");
        let endpoints = tool
            .get("endpointsUsed")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for endpoint in endpoints {
            let Some(entry) = endpoint.as_str() else { continue };
            for url in extract_urls(entry) {
                if !whitelist.allows(&url) {
                    return Err(GenError::PlanValidation(format!(
                        "tool \"{name}\" uses endpoint \"{entry}\" outside the whitelist"
                    )));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests_support::MockLLM;
    use serde_json::json;

    fn valid_plan_json() -> String {
        json!({
            "tools": [{
                "name": "add_numbers",
                "description": "Add two numbers",
                "inputSchema": {"type": "object", "properties": {"a": {"type": "number"}, "b": {"type": "number"}}},
                "endpointsUsed": [],
                "implementationNotes": "Return String(a + b).",
                "needsNetwork": false
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_plan_accepts_fenced_json() {
        let llm = Arc::new(MockLLM::new(vec![format!(
            "Here you go:\n```json\n{}\n```",
            valid_plan_json()
        )]));
        let planner = Planner::new(llm.clone());
        let plan = planner
            .plan("calculator", &[], &Whitelist::default())
            .await
            .unwrap();
        assert_eq!(plan.tools.len(), 1);
        assert_eq!(plan.tools[0].name, "add_numbers");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_plan_retries_once_on_bad_json_then_succeeds() {
        let llm = Arc::new(MockLLM::new(vec![
            "I would suggest some tools!".to_string(),
            valid_plan_json(),
        ]));
        let planner = Planner::new(llm.clone());
        let plan = planner
            .plan("calculator", &[], &Whitelist::default())
            .await
            .unwrap();
        assert_eq!(plan.tools.len(), 1);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_plan_fails_after_second_bad_attempt() {
        let llm = Arc::new(MockLLM::new(vec![
            "nope".to_string(),
            "still nope".to_string(),
            valid_plan_json(),
        ]));
        let planner = Planner::new(llm.clone());
        let err = planner
            .plan("calculator", &[], &Whitelist::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::PlanValidation(_)), "{err}");
        // The third response is never requested
        assert_eq!(llm.calls(), 2);
    }

    #[test]
    fn test_structure_rejects_bad_identifiers() {
        let plan = json!({"tools": [{
            "name": "Add-Numbers",
            "description": "d",
            "inputSchema": {"type": "object"},
            "endpointsUsed": [],
            "implementationNotes": "n",
            "needsNetwork": false
        }]});
        let err = validate_structure(&plan).unwrap_err();
        assert!(err.to_string().contains("Add-Numbers"), "{err}");
    }

    #[test]
    fn test_structure_rejects_duplicate_names() {
        let tool = json!({
            "name": "dup",
            "description": "d",
            "inputSchema": {"type": "object"},
            "endpointsUsed": [],
            "implementationNotes": "n",
            "needsNetwork": false
        });
        let plan = json!({"tools": [tool, tool]});
        let err = validate_structure(&plan).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
    }

    #[test]
    fn test_structure_rejects_empty_plan() {
        assert!(validate_structure(&json!({"tools": []})).is_err());
        assert!(validate_structure(&json!({})).is_err());
    }

    #[test]
    fn test_structure_rejects_non_object_schema() {
        let plan = json!({"tools": [{
            "name": "t",
            "description": "d",
            "inputSchema": {"type": "string"},
            "endpointsUsed": [],
            "implementationNotes": "n",
            "needsNetwork": false
        }]});
        assert!(validate_structure(&plan).is_err());
    }

    #[test]
    fn test_whitelist_validation_names_tool_and_endpoint() {
        let whitelist = Whitelist::from_domains(["api.example.com".to_string()]);
        let plan = json!({"tools": [{
            "name": "exfiltrate",
            "needsNetwork": true,
            "endpointsUsed": ["POST https://evil.com/upload"]
        }]});
        let err = validate_whitelist(&plan, &whitelist).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exfiltrate"), "{message}");
        assert!(message.contains("evil.com"), "{message}");
    }

    #[test]
    fn test_whitelist_validation_allows_subdomains_and_pure_tools() {
        let whitelist = Whitelist::from_domains(["example.com".to_string()]);
        let plan = json!({"tools": [
            {"name": "ok", "needsNetwork": true, "endpointsUsed": ["https://api.example.com/v1"]},
            {"name": "pure", "needsNetwork": false, "endpointsUsed": ["https://evil.com ignored for pure tools"]}
        ]});
        assert!(validate_whitelist(&plan, &whitelist).is_ok());
    }
}
