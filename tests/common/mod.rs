/*!
 * Common test utilities for the doctran test suite
 */

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tempfile::TempDir;

use doctran::app_config::{Config, TranslationCommonConfig};
use doctran::errors::ProviderError;
use doctran::extraction::{
    AssetRef, BoundingBox, ContentSpan, DocumentAnalysis, FigureId, FigureRegion, SpanKind,
};
use doctran::providers::{BackendRequest, TranslationBackend};
use doctran::translation::TranslationService;

static INIT_LOGGING: Once = Once::new();

/// Initialize captured logging once for the whole test binary
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> anyhow::Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> anyhow::Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Shorthand bounding box constructor
pub fn bbox(x: f32, y: f32, width: f32, height: f32) -> BoundingBox {
    BoundingBox::new(x, y, width, height)
}

/// Build a content span on page 1
pub fn span(offset: usize, length: usize, kind: SpanKind, b: BoundingBox) -> ContentSpan {
    ContentSpan {
        offset,
        length,
        kind,
        page_number: 1,
        bbox: b,
    }
}

/// Build a figure region on page 1
pub fn figure(id: u32, b: BoundingBox, anchor_offset: usize) -> FigureRegion {
    FigureRegion {
        id: FigureId(id),
        page_number: 1,
        bbox: b,
        anchor_offset,
        asset_ref: AssetRef(format!("asset://figures/{}.png", id)),
    }
}

/// An analysis with one paragraph of prose, one noise span overlapping a
/// figure, and one trailing paragraph. Offsets are byte-exact:
///
/// ```text
/// [0, 30)   "The first paragraph of prose. "  paragraph
/// [30, 42)  "fig 1 labels"                    noise over figure 7
/// [43, 72)  "The closing paragraph here on"   paragraph
/// ```
pub fn sample_analysis() -> DocumentAnalysis {
    let text =
        "The first paragraph of prose. fig 1 labels The closing paragraph here on".to_string();
    assert_eq!(text.len(), 72);

    let prose_box = bbox(0.0, 0.0, 100.0, 20.0);
    let figure_box = bbox(0.0, 40.0, 80.0, 60.0);
    let noise_box = bbox(10.0, 50.0, 30.0, 10.0);
    let closing_box = bbox(0.0, 110.0, 100.0, 20.0);

    DocumentAnalysis {
        spans: vec![
            span(0, 30, SpanKind::Paragraph, prose_box),
            span(30, 12, SpanKind::Paragraph, noise_box),
            span(43, 29, SpanKind::Paragraph, closing_box),
        ],
        figures: vec![figure(7, figure_box, 30)],
        text,
    }
}

/// A config tuned for fast tests: tiny backoff, single retry
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.common = TranslationCommonConfig {
        retry_count: 1,
        retry_backoff_ms: 5,
        temperature: 0.0,
    };
    config
}

/// Wrap a backend in a service using the fast test config
pub fn service_with(backend: Arc<dyn TranslationBackend>) -> TranslationService {
    TranslationService::with_backend(backend, test_config().translation)
}

/// Test backend that fails permanently for any chunk containing a marker
/// substring and translates everything else
#[derive(Debug)]
pub struct FailingOnBackend {
    needle: String,
    calls: Arc<AtomicUsize>,
}

impl FailingOnBackend {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationBackend for FailingOnBackend {
    async fn translate(&self, request: &BackendRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.text.contains(&self.needle) {
            return Err(ProviderError::ApiError {
                status_code: 400,
                message: "marker chunk rejected".to_string(),
            });
        }
        Ok(format!("[{}] {}", request.target_language, request.text))
    }

    fn name(&self) -> &'static str {
        "failing-on"
    }
}
