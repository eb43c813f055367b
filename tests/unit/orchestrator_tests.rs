/*!
 * Tests for concurrent chunk translation, retry, and cancellation
 */

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use doctran::chunking::Chunk;
use doctran::errors::{PipelineError, PipelineWarning};
use doctran::providers::mock::MockBackend;
use doctran::translation::{
    reassemble, CancellationToken, ChunkStatus, TranslationOrchestrator,
};

use crate::common::{service_with, FailingOnBackend};

fn chunks(texts: &[&str]) -> Vec<Chunk> {
    texts
        .iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            text: text.to_string(),
            placeholder_tokens: BTreeSet::new(),
        })
        .collect()
}

fn no_progress(_current: usize, _total: usize) {}

/// All chunks translate and results come back indexed in order
#[tokio::test]
async fn test_translate_chunks_withWorkingBackend_shouldTranslateAllInOrder() {
    let service = service_with(Arc::new(MockBackend::working()));
    let orchestrator = TranslationOrchestrator::new(service).with_concurrency(3);

    let input = chunks(&["alpha ", "beta ", "gamma"]);
    let (results, warnings) = orchestrator
        .translate_chunks(&input, "en", "fr", &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(results.len(), 3);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.index, i);
        assert_eq!(result.status, ChunkStatus::Ok);
    }
    assert_eq!(reassemble(&results), "[fr] alpha [fr] beta [fr] gamma");
}

/// Transient failures are retried with backoff until they succeed
#[tokio::test]
async fn test_translate_chunks_withFlakyBackend_shouldRetryTransientErrors() {
    let backend = MockBackend::flaky(2);
    let counter = backend.call_counter();
    let service = service_with(Arc::new(backend));
    let orchestrator = TranslationOrchestrator::new(service)
        .with_concurrency(1)
        .with_retry(3, 1);

    let input = chunks(&["only chunk"]);
    let (results, warnings) = orchestrator
        .translate_chunks(&input, "en", "de", &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert!(warnings.is_empty());
    assert_eq!(results[0].status, ChunkStatus::Ok);
    // Two rate-limited attempts plus the successful one.
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

/// Permanent failures are not retried and keep the original text
#[tokio::test]
async fn test_translate_chunks_withPermanentFailure_shouldNotRetry() {
    let backend = MockBackend::failing();
    let counter = backend.call_counter();
    let service = service_with(Arc::new(backend));
    let orchestrator = TranslationOrchestrator::new(service)
        .with_concurrency(1)
        .with_retry(3, 1);

    let input = chunks(&["doomed chunk"]);
    let (results, warnings) = orchestrator
        .translate_chunks(&input, "en", "fr", &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert_eq!(results[0].status, ChunkStatus::Failed);
    assert_eq!(results[0].text, "doomed chunk");
    assert_eq!(warnings.len(), 1);
    // A 400 is permanent: exactly one call, no retries.
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

/// One of three chunks failing still produces a usable document: the
/// other two translated, the failed chunk's original text, one warning
#[tokio::test]
async fn test_translate_chunks_withOneBadChunk_shouldDegradeLocally() {
    let service = service_with(Arc::new(FailingOnBackend::new("FAILME")));
    let orchestrator = TranslationOrchestrator::new(service)
        .with_concurrency(2)
        .with_retry(1, 1);

    let input = chunks(&["first part. ", "FAILME middle. ", "last part."]);
    let (results, warnings) = orchestrator
        .translate_chunks(&input, "en", "es", &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert_eq!(results[0].status, ChunkStatus::Ok);
    assert_eq!(results[1].status, ChunkStatus::Failed);
    assert_eq!(results[2].status, ChunkStatus::Ok);

    let reassembled = reassemble(&results);
    assert!(reassembled.contains("[es] first part. "));
    assert!(reassembled.contains("FAILME middle. "));
    assert!(reassembled.contains("[es] last part."));

    assert_eq!(warnings.len(), 1);
    assert!(matches!(
        &warnings[0],
        PipelineWarning::ChunkTranslationFailure { index: 1, .. }
    ));
}

/// A timeout is treated as a transient failure and retried; exhaustion
/// falls back to the original text
#[tokio::test]
async fn test_translate_chunks_withSlowBackend_shouldTimeOutIntoRetryPath() {
    let backend = MockBackend::slow(500);
    let counter = backend.call_counter();
    let service = service_with(Arc::new(backend));
    let orchestrator = TranslationOrchestrator::new(service)
        .with_concurrency(1)
        .with_retry(1, 1)
        .with_timeout(Duration::from_millis(20));

    let input = chunks(&["slow chunk"]);
    let (results, warnings) = orchestrator
        .translate_chunks(&input, "en", "fr", &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert_eq!(results[0].status, ChunkStatus::Failed);
    assert_eq!(results[0].text, "slow chunk");
    assert_eq!(warnings.len(), 1);
    // Initial attempt plus one retry, both timed out.
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

/// Cancellation before dispatch aborts the whole job with no partial
/// output
#[tokio::test]
async fn test_translate_chunks_withPreCancelledToken_shouldAbortImmediately() {
    let backend = MockBackend::working();
    let counter = backend.call_counter();
    let service = service_with(Arc::new(backend));
    let orchestrator = TranslationOrchestrator::new(service).with_concurrency(2);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let input = chunks(&["a", "b", "c"]);
    let error = orchestrator
        .translate_chunks(&input, "en", "fr", &cancel, no_progress)
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Cancelled));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

/// The progress callback sees every chunk complete, ending at the total
#[tokio::test]
async fn test_translate_chunks_withProgressCallback_shouldReportEveryChunk() {
    let service = service_with(Arc::new(MockBackend::working()));
    let orchestrator = TranslationOrchestrator::new(service).with_concurrency(4);

    let calls = Arc::new(AtomicUsize::new(0));
    let seen_total = Arc::new(AtomicUsize::new(0));
    let calls_in = calls.clone();
    let total_in = seen_total.clone();

    let input = chunks(&["a", "b", "c", "d", "e"]);
    orchestrator
        .translate_chunks(
            &input,
            "en",
            "fr",
            &CancellationToken::new(),
            move |current, total| {
                calls_in.fetch_add(1, Ordering::SeqCst);
                total_in.store(total, Ordering::SeqCst);
                assert!(current <= total);
            },
        )
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(seen_total.load(Ordering::SeqCst), 5);
}

/// Empty chunk lists complete without touching the backend
#[tokio::test]
async fn test_translate_chunks_withNoChunks_shouldReturnEmpty() {
    let backend = MockBackend::working();
    let counter = backend.call_counter();
    let service = service_with(Arc::new(backend));
    let orchestrator = TranslationOrchestrator::new(service);

    let (results, warnings) = orchestrator
        .translate_chunks(&[], "en", "fr", &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert!(warnings.is_empty());
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}
