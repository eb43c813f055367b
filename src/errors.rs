/*!
 * Error types for the doctran application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to a translation provider API
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// A request that did not complete within its per-call timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),
}

impl ProviderError {
    /// Whether the orchestrator should retry a call that failed this way.
    ///
    /// Rate limits, connection problems, timeouts, and server-side errors
    /// are transient; malformed requests and authentication failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimitExceeded(_) | Self::ConnectionError(_) | Self::Timeout(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::RequestFailed(_) => true,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Fatal errors that abort a translation job
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Extractor output violates offset or bounding-box invariants.
    /// Raised before any chunking occurs; never recovered.
    #[error("Structural inconsistency in extractor output: {0}")]
    StructuralInconsistency(String),

    /// User-initiated abort; no partial output is returned
    #[error("Translation job was cancelled")]
    Cancelled,

    /// Error from the provider that made the whole job impossible
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Non-fatal conditions reported alongside a successful result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    /// A chunk could not be translated after retry exhaustion; its
    /// original text was kept as a degraded fallback
    ChunkTranslationFailure {
        /// Index of the failed chunk
        index: usize,
        /// Why the last attempt failed
        reason: String,
    },

    /// A placeholder token was dropped or corrupted by the translation
    /// engine; the figure was recovered by appending it to the document
    UnresolvedPlaceholder {
        /// The canonical token that could not be resolved in place
        token: String,
    },
}

impl std::fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChunkTranslationFailure { index, reason } => {
                write!(f, "chunk {} kept untranslated: {}", index, reason)
            }
            Self::UnresolvedPlaceholder { token } => {
                write!(f, "placeholder {} could not be resolved in place", token)
            }
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the translation pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
