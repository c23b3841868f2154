//! Scripted text generator for tests

use crate::error::{LlmError, Result};
use crate::llm::{GenerateRequest, TextGenerator};
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns queued responses in order; an exhausted queue is an API error.
pub struct MockTextGenerator {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.prompt);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::ApiError {
                status: 500,
                message: "mock response queue exhausted".to_string(),
            }
            .into());
        }
        Ok(responses.remove(0))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
