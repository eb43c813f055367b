/*!
 * Provider implementations for different translation services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration (also serves LM Studio)
 * - Anthropic: Anthropic API integration
 * - Mock: configurable fake for tests
 *
 * Every client is a single-attempt call that classifies failures into
 * [`ProviderError`] variants; the retry/backoff policy belongs to the
 * translation orchestrator, not to the clients.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One translation request as seen by a backend
#[derive(Debug, Clone)]
pub struct BackendRequest {
    /// System instruction (translation role + placeholder preservation)
    pub system_prompt: String,
    /// Chunk text to translate
    pub text: String,
    /// Model name
    pub model: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token ceiling
    pub max_tokens: u32,
}

/// Common trait for all translation backends.
///
/// Object-safe so the orchestrator and pipeline can run against fakes;
/// the concrete backend is chosen once from configuration.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Translate one chunk of text.
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text, or a
    ///   classified error the orchestrator can partition into
    ///   transient/permanent
    async fn translate(&self, request: &BackendRequest) -> Result<String, ProviderError>;

    /// Short provider name for logs and reports
    fn name(&self) -> &'static str;
}

/// Map an HTTP error status to a typed provider error
pub(crate) fn classify_status(status_code: u16, message: String) -> ProviderError {
    match status_code {
        429 => ProviderError::RateLimitExceeded(message),
        401 | 403 => ProviderError::AuthenticationError(message),
        _ => ProviderError::ApiError {
            status_code,
            message,
        },
    }
}

/// Map a reqwest transport error to a typed provider error
pub(crate) fn classify_transport(error: reqwest::Error, timeout_ms: u64) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout_ms)
    } else {
        ProviderError::ConnectionError(error.to_string())
    }
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
