//! OpenAI-compatible chat client implementation

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{GenerateRequest, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Client for OpenAI-compatible chat completion APIs
pub struct OpenAiCompatClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    /// Create a new client from a resolved config
    pub fn new(config: &LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::MissingCredential {
                message: "No API key configured for text generation".to_string(),
            }
            .into());
        }

        Ok(Self {
            client: Client::new(),
            config: config.clone(),
        })
    }

    fn build_request(&self, request: &GenerateRequest) -> serde_json::Value {
        let content = match &request.image {
            Some(image) => json!([
                { "type": "image_url", "image_url": { "url": image.to_data_url() } },
                { "type": "text", "text": request.prompt },
            ]),
            None => json!(request.prompt),
        };

        let mut body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": content }],
        });

        let params = &self.config.params;
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temperature) = params.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = params.top_p {
            body["top_p"] = json!(top_p);
        }
        if let Some(stop) = &params.stop_sequences {
            body["stop"] = json!(stop);
        }

        body
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let body = self.build_request(&request);

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let mut req = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req.json(&body).send().await.map_err(|e| LlmError::Network {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
