use async_trait::async_trait;
use log::error;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{classify_status, classify_transport, BackendRequest, TranslationBackend};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Per-request timeout in milliseconds, for error reporting
    timeout_ms: u64,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    /// Model name to use for generation
    model: &'a str,
    /// Prompt to generate from
    prompt: &'a str,
    /// System message to guide the model
    system: &'a str,
    /// Additional model parameters
    options: GenerationOptions,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
struct GenerationOptions {
    temperature: f32,
    num_predict: u32,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
struct GenerationResponse {
    /// Generated text
    response: String,
    /// Whether the generation is complete
    #[serde(default)]
    #[allow(dead_code)]
    done: bool,
}

impl Ollama {
    /// Create a new Ollama client.
    ///
    /// Uses connection pooling for better performance with concurrent
    /// requests; Ollama speaks HTTP/1.1.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url = normalize_base_url(endpoint.into());
        Self {
            base_url,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .pool_max_idle_per_host(20)
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            timeout_ms: timeout_secs * 1000,
        }
    }
}

/// Add a scheme when the configured endpoint has none
fn normalize_base_url(endpoint: String) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranslationBackend for Ollama {
    async fn translate(&self, request: &BackendRequest) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerationRequest {
            model: &request.model,
            prompt: &request.text,
            system: &request.system_prompt,
            options: GenerationOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
            stream: false,
        };

        let response = self
            .client
            .post(&url)
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
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(classify_status(status.as_u16(), error_text));
        }

        let generated = response
            .json::<GenerationResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Ollama response: {}", e)))?;

        Ok(generated.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
