use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{classify_status, classify_transport, BackendRequest, TranslationBackend};

/// Anthropic client for interacting with the Anthropic messages API
#[derive(Debug)]
pub struct Anthropic {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Per-request timeout in milliseconds, for error reporting
    timeout_ms: u64,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    /// The model to use
    model: &'a str,
    /// The messages for the conversation
    messages: Vec<AnthropicMessage<'a>>,
    /// System prompt to guide the AI
    system: &'a str,
    /// Temperature for generation
    temperature: f32,
    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    /// Role of the message sender (user, assistant)
    role: &'a str,
    /// Content of the message
    content: &'a str,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    /// The content of the response
    content: Vec<AnthropicContent>,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    content_type: String,
    /// The actual text content
    #[serde(default)]
    text: String,
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            timeout_ms: timeout_secs * 1000,
        }
    }

    fn messages_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl TranslationBackend for Anthropic {
    async fn translate(&self, request: &BackendRequest) -> Result<String, ProviderError> {
        let body = AnthropicRequest {
            model: &request.model,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.text,
            }],
            system: &request.system_prompt,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(e, self.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let anthropic_response = response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Anthropic response: {}", e)))?;

        let text: String = anthropic_response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(ProviderError::ParseError(
                "Anthropic response contained no text blocks".to_string(),
            ));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
