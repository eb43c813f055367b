/*!
 * Translation services for masked document text.
 *
 * This module contains the functionality for translating placeholder-
 * bearing chunks using AI providers. It is split into several submodules:
 *
 * - `core`: Core translation functionality and service definition
 * - `orchestrator`: Concurrent chunk dispatch, retry, and reassembly
 * - `cache`: Caching mechanisms for translations
 * - `prompts`: Prompt templates for placeholder-preserving translation
 */

// Re-export main types for easier usage
pub use self::core::TranslationService;
pub use self::orchestrator::{
    reassemble, CancellationToken, ChunkResult, ChunkStatus, TranslationOrchestrator,
};
pub use self::prompts::PromptTemplate;

// Submodules
pub mod cache;
pub mod core;
pub mod orchestrator;
pub mod prompts;
