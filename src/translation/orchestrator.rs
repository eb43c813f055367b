/*!
 * Concurrent chunk translation with retry, backoff, and cancellation.
 *
 * Chunks are dispatched to a bounded worker pool; the network call is the
 * pipeline's only suspension point. Dispatch order is arbitrary, but
 * results land in one pre-sized slot per chunk index, so reassembly is
 * deterministic regardless of completion order. A chunk whose retries are
 * exhausted keeps its original text as a degraded fallback instead of
 * failing the whole document.
 */

use futures::stream::{self, StreamExt};
use log::{debug, warn};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::chunking::Chunk;
use crate::errors::{PipelineError, PipelineWarning, ProviderError};
use crate::translation::core::TranslationService;

/// Terminal state of one chunk translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    /// Translated successfully
    Ok,
    /// Retries exhausted or permanent failure; original text kept
    Failed,
}

/// Result of translating one chunk, collected unordered and reassembled
/// by `index`
#[derive(Debug, Clone)]
pub struct ChunkResult {
    /// Original chunk index
    pub index: usize,
    /// Translated text, or the original text for failed chunks
    pub text: String,
    /// Outcome status
    pub status: ChunkStatus,
}

/// Single cancellation signal for a whole translation job.
///
/// Observed before each dispatch and at every retry boundary. In-flight
/// calls are allowed to complete but their results are discarded once
/// cancellation is observed.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a fresh, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to every worker holding a clone
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Drives the external translation engine over all chunks and delivers
/// ordered results
pub struct TranslationOrchestrator {
    /// The translation service to use
    service: TranslationService,

    /// Maximum number of concurrent requests
    max_concurrent_requests: usize,

    /// Retry attempts after the first failure
    retry_count: u32,

    /// Base backoff in milliseconds, doubled per retry
    backoff_base_ms: u64,

    /// Per-attempt timeout; expiry enters the retry path
    request_timeout: Duration,
}

impl TranslationOrchestrator {
    /// Create a new orchestrator configured from the service's settings
    pub fn new(service: TranslationService) -> Self {
        let max_concurrent_requests = service.config.optimal_concurrent_requests();
        let retry_count = service.config.common.retry_count;
        let backoff_base_ms = service.config.common.retry_backoff_ms;
        let request_timeout = Duration::from_secs(service.config.get_timeout_secs());

        Self {
            service,
            max_concurrent_requests,
            retry_count,
            backoff_base_ms,
            request_timeout,
        }
    }

    /// Override the worker pool size
    pub fn with_concurrency(mut self, max_concurrent_requests: usize) -> Self {
        self.max_concurrent_requests = max_concurrent_requests.max(1);
        self
    }

    /// Override retry and backoff settings
    pub fn with_retry(mut self, retry_count: u32, backoff_base_ms: u64) -> Self {
        self.retry_count = retry_count;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Override the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Translate all chunks with bounded concurrency.
    ///
    /// Returns results for every chunk (Failed chunks keep their original
    /// text) plus the warnings collected along the way, or
    /// [`PipelineError::Cancelled`] with no partial output.
    pub async fn translate_chunks(
        &self,
        chunks: &[Chunk],
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<(Vec<ChunkResult>, Vec<PipelineWarning>), PipelineError> {
        if chunks.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        // Create a semaphore to limit concurrent requests
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));
        let total = chunks.len();
        let processed = Arc::new(AtomicUsize::new(0));

        let outcomes = stream::iter(chunks.iter())
            .map(|chunk| {
                let service = self.service.clone();
                let semaphore = semaphore.clone();
                let cancel = cancel.clone();
                let processed = processed.clone();
                let progress_callback = progress_callback.clone();
                let source_language = source_language.to_string();
                let target_language = target_language.to_string();
                let retry_count = self.retry_count;
                let backoff_base_ms = self.backoff_base_ms;
                let request_timeout = self.request_timeout;

                async move {
                    // Acquire a permit from the semaphore
                    let _permit = semaphore.acquire().await.expect("semaphore closed");

                    if cancel.is_cancelled() {
                        return (chunk.index, None);
                    }

                    let started = Instant::now();
                    let result = translate_with_retry(
                        &service,
                        chunk,
                        &source_language,
                        &target_language,
                        &cancel,
                        retry_count,
                        backoff_base_ms,
                        request_timeout,
                    )
                    .await;

                    let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress_callback(current, total);

                    if let Some(Ok(_)) = &result {
                        debug!(
                            "Chunk {} of {} translated in {:?}",
                            chunk.index + 1,
                            total,
                            started.elapsed()
                        );
                    }

                    (chunk.index, result)
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        if cancel.is_cancelled() {
            // Already-completed chunk results are discarded; cancellation
            // never yields partial output.
            return Err(PipelineError::Cancelled);
        }

        // One pre-sized write slot per chunk index; concurrent completion
        // order cannot contend or reorder anything here.
        let mut slots: Vec<Option<ChunkResult>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);
        let mut warnings = Vec::new();

        for (index, outcome) in outcomes {
            let result = match outcome {
                Some(Ok(text)) => ChunkResult {
                    index,
                    text,
                    status: ChunkStatus::Ok,
                },
                Some(Err(error)) => {
                    warn!(
                        "Chunk {} kept untranslated after retry exhaustion: {}",
                        index, error
                    );
                    warnings.push(PipelineWarning::ChunkTranslationFailure {
                        index,
                        reason: error.to_string(),
                    });
                    ChunkResult {
                        index,
                        text: chunks[index].text.clone(),
                        status: ChunkStatus::Failed,
                    }
                }
                None => {
                    warnings.push(PipelineWarning::ChunkTranslationFailure {
                        index,
                        reason: "dispatch skipped".to_string(),
                    });
                    ChunkResult {
                        index,
                        text: chunks[index].text.clone(),
                        status: ChunkStatus::Failed,
                    }
                }
            };
            slots[index] = Some(result);
        }

        let results = slots
            .into_iter()
            .map(|slot| slot.expect("every chunk index has exactly one slot"))
            .collect();

        Ok((results, warnings))
    }
}

/// Retry loop for one chunk. Returns `None` when cancellation was
/// observed at a retry boundary.
#[allow(clippy::too_many_arguments)]
async fn translate_with_retry(
    service: &TranslationService,
    chunk: &Chunk,
    source_language: &str,
    target_language: &str,
    cancel: &CancellationToken,
    retry_count: u32,
    backoff_base_ms: u64,
    request_timeout: Duration,
) -> Option<Result<String, ProviderError>> {
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return None;
        }

        let outcome = match tokio::time::timeout(
            request_timeout,
            service.translate_text(&chunk.text, source_language, target_language),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(request_timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(translated) => return Some(Ok(translated)),
            Err(error) if error.is_transient() && attempt < retry_count => {
                attempt += 1;
                warn!(
                    "Chunk {} attempt {}/{} failed with transient error: {}",
                    chunk.index,
                    attempt,
                    retry_count + 1,
                    error
                );

                let shift = (attempt - 1).min(16);
                let backoff_ms = backoff_base_ms.saturating_mul(1u64 << shift);
                let jitter_ms = if backoff_base_ms >= 4 {
                    rand::rng().random_range(0..=backoff_base_ms / 4)
                } else {
                    0
                };
                tokio::time::sleep(Duration::from_millis(backoff_ms.saturating_add(jitter_ms)))
                    .await;
            }
            Err(error) => return Some(Err(error)),
        }
    }
}

/// Concatenate chunk results strictly by index, independent of the order
/// the network delivered them
pub fn reassemble(results: &[ChunkResult]) -> String {
    let mut sorted: Vec<&ChunkResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.index);
    sorted.iter().map(|r| r.text.as_str()).collect()
}
