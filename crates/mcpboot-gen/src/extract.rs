//! Pulling structured payloads out of LLM responses
//!
//! Models wrap their output in prose and code fences despite instructions;
//! extraction is forgiving, validation downstream is not.

use std::sync::OnceLock;

use regex::Regex;

fn json_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json\s*\n?(.*?)```").unwrap())
}

fn code_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:javascript|js|typescript|ts)?\s*\n(.*?)```").unwrap()
    })
}

/// Extract the most plausible JSON blob: a fenced ```json block, else the
/// outermost `{ … }` span, else the raw text.
pub fn extract_json(response: &str) -> String {
    if let Some(caps) = json_fence_regex().captures(response) {
        return caps[1].trim().to_string();
    }
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return response[start..=end].to_string();
        }
    }
    response.trim().to_string()
}

/// Extract handler source from a fenced code block, else take the response
/// as-is.
pub fn extract_code(response: &str) -> String {
    if let Some(caps) = code_fence_regex().captures(response) {
        return caps[1].trim().to_string();
    }
    response.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_from_fence() {
        let response = "Here's the plan:\n```json\n{\"tools\": []}\n```\nDone.";
        assert_eq!(extract_json(response), "{\"tools\": []}");
    }

    #[test]
    fn test_extract_json_from_brace_span() {
        let response = "The plan is {\"tools\": [{\"name\": \"a\"}]} as requested.";
        assert_eq!(extract_json(response), "{\"tools\": [{\"name\": \"a\"}]}");
    }

    #[test]
    fn test_extract_json_raw_fallback() {
        assert_eq!(extract_json("  not json at all  "), "not json at all");
    }

    #[test]
    fn test_extract_code_from_javascript_fence() {
        let response = "```javascript\nreturn {content: []};\n```";
        assert_eq!(extract_code(response), "return {content: []};");
    }

    #[test]
    fn test_extract_code_from_bare_fence() {
        let response = "```\nreturn {content: []};\n```";
        assert_eq!(extract_code(response), "return {content: []};");
    }

    #[test]
    fn test_extract_code_raw_fallback() {
        assert_eq!(extract_code("return 1;"), "return 1;");
    }
}
