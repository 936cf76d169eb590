//! Shared test double for the LLM client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mcpboot_llm::{LLMClient, LLMError};

/// Replays a queue of canned responses and counts calls.
pub struct MockLLM {
    responses: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockLLM {
    pub fn new(responses: Vec<String>) -> Self {
        let mut responses = responses;
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for MockLLM {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, _system: &str, _user: &str) -> Result<String, LLMError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or(LLMError::EmptyResponse)
    }
}
