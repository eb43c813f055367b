/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct, which selects
 * a provider backend from configuration, renders the placeholder-
 * preserving system prompt, and performs single chunk translations.
 * Retry and concurrency live in the orchestrator.
 */

use anyhow::Result;
use std::sync::Arc;

use crate::app_config::{TranslationConfig, TranslationProvider};
use crate::errors::ProviderError;
use crate::providers::anthropic::Anthropic;
use crate::providers::ollama::Ollama;
use crate::providers::openai::OpenAi;
use crate::providers::{BackendRequest, TranslationBackend};
use crate::translation::cache::TranslationCache;
use crate::translation::prompts::PromptTemplate;

/// Main translation service for masked document text
pub struct TranslationService {
    /// Selected provider backend
    backend: Arc<dyn TranslationBackend>,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// System prompt template
    prompt: PromptTemplate,

    /// Translation cache for storing and retrieving translations
    pub cache: TranslationCache,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let timeout_secs = config.get_timeout_secs();
        let backend: Arc<dyn TranslationBackend> = match config.provider {
            TranslationProvider::Ollama => {
                Arc::new(Ollama::new(config.get_endpoint(), timeout_secs))
            }
            TranslationProvider::OpenAI => Arc::new(OpenAi::new(
                config.get_api_key(),
                config.get_endpoint(),
                timeout_secs,
            )),
            TranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };
                Arc::new(OpenAi::new(api_key, config.get_endpoint(), timeout_secs))
            }
            TranslationProvider::Anthropic => Arc::new(Anthropic::new(
                config.get_api_key(),
                config.get_endpoint(),
                timeout_secs,
            )),
        };

        Ok(Self::with_backend(backend, config))
    }

    /// Create a service over an explicit backend.
    ///
    /// This is the seam that makes the pipeline testable with fakes; no
    /// backend state is ever held globally.
    pub fn with_backend(backend: Arc<dyn TranslationBackend>, config: TranslationConfig) -> Self {
        Self {
            backend,
            config,
            prompt: PromptTemplate::default(),
            cache: TranslationCache::new(true), // Enable cache by default
        }
    }

    /// Name of the active backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Translate a single chunk of text.
    ///
    /// Whitespace-only chunks are returned unchanged so document layout
    /// survives reassembly.
    pub async fn translate_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        // Check cache first
        if let Some(cached) = self.cache.get(text, source_language, target_language) {
            return Ok(cached);
        }

        let model = self.config.get_model();
        let request = BackendRequest {
            system_prompt: self.prompt.render(source_language, target_language),
            text: text.to_string(),
            max_tokens: Self::max_tokens_for_model(&model),
            model,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            temperature: self.config.common.temperature,
        };

        let translated = self.backend.translate(&request).await?;

        // Store in cache
        self.cache
            .store(text, source_language, target_language, &translated);

        Ok(translated)
    }

    /// Get the maximum number of completion tokens for a given model
    fn max_tokens_for_model(model: &str) -> u32 {
        match model {
            // OpenAI models
            "gpt-4o" | "gpt-4o-mini" => 16384,
            "gpt-4-turbo" | "gpt-4-turbo-preview" => 4096,
            "gpt-3.5-turbo" => 4096,

            // Anthropic models
            m if m.starts_with("claude-3") => 4096,

            // Default for unknown/local models
            _ => 4096,
        }
    }
}

impl Clone for TranslationService {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config.clone(),
            prompt: self.prompt.clone(),
            cache: self.cache.clone(),
        }
    }
}
