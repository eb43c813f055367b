/*!
 * # doctran - Document Translation with Figure Masking
 *
 * A Rust library for translating structured documents (PDF/Word analysis
 * output) using AI while preserving embedded figures.
 *
 * ## Features
 *
 * - Mask figure OCR noise behind stable placeholder tokens
 * - Translate documents using various AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 * - Bounded-concurrency chunk translation with retry and backoff
 * - Tolerant placeholder recovery - a figure is never lost, even when
 *   the translation engine mangles or drops its token
 * - Per-job audit of every placeholder resolution
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `extraction`: Document analysis data model and extractor boundary
 * - `masking`: Overlap resolution, placeholder substitution and recovery
 * - `chunking`: Budgeted, placeholder-atomic chunk planning
 * - `translation`: AI-powered translation services:
 *   - `translation::core`: Core translation functionality
 *   - `translation::orchestrator`: Concurrent dispatch and reassembly
 *   - `translation::cache`: Caching mechanisms for translations
 * - `pipeline`: End-to-end translation jobs
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Client implementations for various LLM providers
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod chunking;
pub mod errors;
pub mod extraction;
pub mod file_utils;
pub mod language_utils;
pub mod masking;
pub mod pipeline;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use chunking::{Chunk, ChunkPlanner};
pub use errors::{AppError, PipelineError, PipelineWarning, ProviderError};
pub use extraction::{ContentSpan, DocumentAnalysis, FigureRegion};
pub use masking::{OverlapResolver, RemovalInterval};
pub use pipeline::{PipelineReport, TranslationPipeline};
pub use translation::{CancellationToken, TranslationService};
