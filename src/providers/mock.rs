/*!
 * Mock backend implementations for testing.
 *
 * This module provides mock backends that simulate different behaviors:
 * - `MockBackend::working()` - Always succeeds with translated text
 * - `MockBackend::failing()` - Always fails with a permanent error
 * - `MockBackend::flaky(n)` - Fails transiently for the first n calls
 * - `MockBackend::dropping_tokens()` - Strips placeholder tokens
 * - `MockBackend::mangling_tokens()` - Corrupts placeholder formatting
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::masking::placeholder::CANONICAL_TOKEN_RE;
use crate::providers::{BackendRequest, TranslationBackend};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a marked-up translation
    Working,
    /// Always fails with a permanent (non-retryable) error
    Failing,
    /// Fails with a rate-limit signal for the first `fail_first` calls,
    /// then succeeds
    Flaky {
        /// Number of leading calls that fail
        fail_first: usize,
    },
    /// Sleeps before answering (for timeout testing)
    Slow {
        /// Delay before responding
        delay_ms: u64,
    },
    /// Succeeds but removes every placeholder token from the output
    DroppingTokens,
    /// Succeeds but rewrites placeholder tokens with drifted punctuation
    ManglingTokens,
}

/// Mock backend for testing orchestration and resolution behavior
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total calls observed
    request_count: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock backend that always errors permanently
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that rate-limits the first `fail_first` calls
    pub fn flaky(fail_first: usize) -> Self {
        Self::new(MockBehavior::Flaky { fail_first })
    }

    /// Create a mock that delays each response
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock that drops placeholder tokens from its output
    pub fn dropping_tokens() -> Self {
        Self::new(MockBehavior::DroppingTokens)
    }

    /// Create a mock that mangles placeholder token formatting
    pub fn mangling_tokens() -> Self {
        Self::new(MockBehavior::ManglingTokens)
    }

    /// Number of translate calls observed so far
    pub fn calls(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the call counter, for assertions after the
    /// backend has been moved into a service
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.request_count.clone()
    }

    fn translated(request: &BackendRequest) -> String {
        format!("[{}] {}", request.target_language, request.text)
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(&self, request: &BackendRequest) -> Result<String, ProviderError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(Self::translated(request)),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 400,
                message: "mock permanent failure".to_string(),
            }),
            MockBehavior::Flaky { fail_first } => {
                if call < fail_first {
                    Err(ProviderError::RateLimitExceeded(format!(
                        "mock rate limit on call {}",
                        call
                    )))
                } else {
                    Ok(Self::translated(request))
                }
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Self::translated(request))
            }
            MockBehavior::DroppingTokens => {
                let stripped = CANONICAL_TOKEN_RE.replace_all(&request.text, "");
                Ok(format!("[{}] {}", request.target_language, stripped))
            }
            MockBehavior::ManglingTokens => {
                let mangled = CANONICAL_TOKEN_RE
                    .replace_all(&request.text, |caps: &regex::Captures<'_>| {
                        format!("<doc fig {}>", &caps[1])
                    });
                Ok(format!("[{}] {}", request.target_language, mangled))
            }
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
