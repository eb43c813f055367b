/*!
 * End-to-end pipeline tests over mock backends
 */

use std::sync::Arc;

use doctran::errors::{PipelineError, PipelineWarning};
use doctran::extraction::{DocumentAnalysis, FigureId, SpanKind};
use doctran::masking::OutputSegment;
use doctran::pipeline::TranslationPipeline;
use doctran::providers::mock::MockBackend;
use doctran::translation::CancellationToken;

use crate::common::{
    bbox, figure, sample_analysis, service_with, span, test_config, FailingOnBackend,
};

fn no_progress(_current: usize, _total: usize) {}

fn pipeline_with(backend: Arc<dyn doctran::providers::TranslationBackend>) -> TranslationPipeline {
    crate::common::init_test_logging();
    TranslationPipeline::with_service(test_config(), service_with(backend))
}

/// Three equal paragraphs; the planner closes a chunk at each boundary
/// when the budget is tuned below two paragraphs
fn three_paragraph_analysis(middle_marker: &str) -> DocumentAnalysis {
    let pad = |seed: &str| {
        let mut s = seed.to_string();
        while s.len() < 99 {
            s.push_str(" pad");
            s.truncate(99);
        }
        s.push(' ');
        s
    };
    let first = pad("The opening paragraph talks about the experiment setup.");
    let second = pad(&format!("The middle paragraph {} continues the story.", middle_marker));
    let third = pad("The closing paragraph sums everything up nicely.");
    let text = format!("{}{}{}", first, second, third);
    assert_eq!(text.len(), 300);

    DocumentAnalysis {
        spans: vec![
            span(0, 100, SpanKind::Paragraph, bbox(0.0, 0.0, 100.0, 20.0)),
            span(100, 100, SpanKind::Paragraph, bbox(0.0, 30.0, 100.0, 20.0)),
            span(200, 100, SpanKind::Paragraph, bbox(0.0, 60.0, 100.0, 20.0)),
        ],
        figures: vec![],
        text,
    }
}

/// Scenario: a figure with no overlapping spans still yields exactly one
/// placeholder and one image reference in the output
#[tokio::test]
async fn test_pipeline_withFigureWithoutOcrSpans_shouldEmitOneImageReference() {
    let text = "A page of prose with no figure noise at all. More prose follows.".to_string();
    let analysis = DocumentAnalysis {
        spans: vec![span(0, 44, SpanKind::Paragraph, bbox(0.0, 0.0, 100.0, 10.0))],
        figures: vec![figure(1, bbox(0.0, 200.0, 50.0, 50.0), 45)],
        text,
    };

    let pipeline = pipeline_with(Arc::new(MockBackend::working()));
    let report = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    let figure_segments: Vec<_> = report
        .document
        .segments
        .iter()
        .filter(|s| matches!(s, OutputSegment::Figure { .. }))
        .collect();
    assert_eq!(figure_segments.len(), 1);
    assert_eq!(report.document.outcomes.len(), 1);
    assert!(report.document.outcomes[0].resolved);
    assert!(report.warnings.is_empty());
    assert!(report.document.render_text().contains("asset://figures/1.png"));
}

/// The sample document translates with its figure resolved in place
/// between the surrounding paragraphs
#[tokio::test]
async fn test_pipeline_withSampleDocument_shouldResolveFigureInPlace() {
    let analysis = sample_analysis();

    let pipeline = pipeline_with(Arc::new(MockBackend::working()));
    let report = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert!(report.is_clean());
    let rendered = report.document.render_text();
    let figure_pos = rendered.find("asset://figures/7.png").unwrap();
    let closing_pos = rendered.find("The closing paragraph").unwrap();
    assert!(
        figure_pos < closing_pos,
        "figure must precede the closing paragraph: {}",
        rendered
    );
}

/// Scenario: the engine mangles placeholder punctuation; the resolver
/// still recovers the correct figure
#[tokio::test]
async fn test_pipeline_withTokenManglingEngine_shouldStillResolveFigure() {
    let analysis = sample_analysis();

    let pipeline = pipeline_with(Arc::new(MockBackend::mangling_tokens()));
    let report = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.document.outcomes.len(), 1);
    assert!(report.document.outcomes[0].resolved);
    assert_eq!(report.document.outcomes[0].figure_id, FigureId(7));
    assert!(report.document.render_text().contains("asset://figures/7.png"));
}

/// Scenario: the engine drops the placeholder entirely; the figure is
/// appended at the end and audited as unresolved
#[tokio::test]
async fn test_pipeline_withTokenDroppingEngine_shouldAppendFigureAndWarn() {
    let analysis = sample_analysis();

    let pipeline = pipeline_with(Arc::new(MockBackend::dropping_tokens()));
    let report = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    // The image is never lost, even though it is misplaced.
    assert!(matches!(
        report.document.segments.last(),
        Some(OutputSegment::Figure { figure_id, .. }) if *figure_id == FigureId(7)
    ));
    assert_eq!(report.document.unresolved().count(), 1);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, PipelineWarning::UnresolvedPlaceholder { .. })));
}

/// Scenario: one of three chunks fails after retries; the other two are
/// translated, the failed chunk keeps its original text, one warning
#[tokio::test]
async fn test_pipeline_withOneFailingChunk_shouldProduceDegradedDocument() {
    let mut config = test_config();
    // 30 tokens = 120 bytes: each 100-byte paragraph becomes one chunk.
    config.pipeline.chunk_budget_tokens = 30;
    let analysis = three_paragraph_analysis("FAILME");

    let service = service_with(Arc::new(FailingOnBackend::new("FAILME")));
    let pipeline = TranslationPipeline::with_service(config, service);
    let report = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.failed_chunks, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        &report.warnings[0],
        PipelineWarning::ChunkTranslationFailure { .. }
    ));

    let rendered = report.document.render_text();
    assert!(rendered.contains("[fr] The opening paragraph"));
    assert!(rendered.contains("The middle paragraph FAILME"));
    assert!(!rendered.contains("[fr] The middle paragraph"));
    assert!(rendered.contains("[fr] The closing paragraph"));
}

/// Cancellation aborts the job with no partial output
#[tokio::test]
async fn test_pipeline_withCancelledToken_shouldAbortWithoutOutput() {
    let analysis = sample_analysis();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let pipeline = pipeline_with(Arc::new(MockBackend::working()));
    let error = pipeline
        .translate_document(&analysis, &cancel, no_progress)
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::Cancelled));
}

/// Structural inconsistencies abort before any chunking occurs
#[tokio::test]
async fn test_pipeline_withBrokenAnalysis_shouldFailFatally() {
    let analysis = DocumentAnalysis {
        text: "tiny".to_string(),
        spans: vec![],
        figures: vec![figure(1, bbox(0.0, 0.0, 10.0, 10.0), 999)],
    };

    let backend = MockBackend::working();
    let counter = backend.call_counter();
    let pipeline = pipeline_with(Arc::new(backend));
    let error = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap_err();

    assert!(matches!(error, PipelineError::StructuralInconsistency(_)));
    assert_eq!(
        counter.load(std::sync::atomic::Ordering::SeqCst),
        0,
        "no chunk may be dispatched after a fatal structural error"
    );
}

/// A document with several figures keeps mapping size equal to the
/// figure count, with pairwise distinct tokens and all figures placed
#[tokio::test]
async fn test_pipeline_withManyFigures_shouldPlaceEveryFigureExactlyOnce() {
    let mut text = String::new();
    let mut spans = Vec::new();
    let mut figures = Vec::new();
    for i in 0u32..4 {
        let para = format!("Paragraph number {} with figure noise FIGTEXT. ", i);
        let start = text.len();
        text.push_str(&para);
        let noise_pos = start + para.find("FIGTEXT").unwrap();
        spans.push(span(start, para.len(), SpanKind::Paragraph, bbox(0.0, i as f32 * 30.0, 100.0, 20.0)));
        spans.push(span(
            noise_pos,
            7,
            SpanKind::Paragraph,
            bbox(5.0, 200.0 + i as f32 * 30.0, 10.0, 10.0),
        ));
        figures.push(figure(i + 1, bbox(0.0, 200.0 + i as f32 * 30.0, 50.0, 20.0), noise_pos));
    }
    let analysis = DocumentAnalysis { text, spans, figures };

    let pipeline = pipeline_with(Arc::new(MockBackend::working()));
    let report = pipeline
        .translate_document(&analysis, &CancellationToken::new(), no_progress)
        .await
        .unwrap();

    assert_eq!(report.document.outcomes.len(), 4);
    assert!(report.document.outcomes.iter().all(|o| o.resolved));

    let placed: Vec<u32> = report
        .document
        .segments
        .iter()
        .filter_map(|s| match s {
            OutputSegment::Figure { figure_id, .. } => Some(figure_id.0),
            _ => None,
        })
        .collect();
    assert_eq!(placed, vec![1, 2, 3, 4]);
}
