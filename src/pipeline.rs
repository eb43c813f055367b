/*!
 * End-to-end translation pipeline.
 *
 * Wires the masking stages around the translation orchestrator:
 * extractor snapshot -> overlap resolution -> placeholder substitution ->
 * chunk planning -> concurrent translation -> placeholder resolution.
 * All stages except the network dispatch are synchronous passes over
 * immutable data; the placeholder mapping is built before any concurrent
 * work starts and is read-only afterwards.
 */

use log::{debug, info};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app_config::Config;
use crate::chunking::{approx_token_cost, block_boundaries, ChunkPlanner};
use crate::errors::{PipelineError, PipelineWarning};
use crate::extraction::DocumentAnalysis;
use crate::masking::overlap::OverlapResolver;
use crate::masking::placeholder::substitute;
use crate::masking::resolver::{resolve_placeholders, ResolvedDocument};
use crate::translation::orchestrator::{
    reassemble, CancellationToken, ChunkStatus, TranslationOrchestrator,
};
use crate::translation::TranslationService;

/// Everything the caller gets back from one translation job: either this
/// report (complete result plus warnings) or a fatal error - never a
/// silently incomplete document.
#[derive(Debug)]
pub struct PipelineReport {
    /// Unique id of this job
    pub job_id: Uuid,
    /// Final document segments and per-placeholder audit
    pub document: ResolvedDocument,
    /// Degraded-mode warnings (failed chunks, unresolved placeholders)
    pub warnings: Vec<PipelineWarning>,
    /// Number of chunks dispatched
    pub chunk_count: usize,
    /// Number of chunks that kept their original text
    pub failed_chunks: usize,
    /// Wall-clock duration of the job
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Whether every chunk translated and every placeholder resolved
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// The document translation pipeline for one configured provider
pub struct TranslationPipeline {
    /// Translation service shared by all jobs of this pipeline
    service: TranslationService,
    /// Application configuration
    config: Config,
}

impl TranslationPipeline {
    /// Create a pipeline from configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let service = TranslationService::new(config.translation.clone())?;
        Ok(Self { service, config })
    }

    /// Create a pipeline over an explicit service (tests use this with a
    /// mock backend)
    pub fn with_service(config: Config, service: TranslationService) -> Self {
        Self { service, config }
    }

    /// Translate one analyzed document.
    ///
    /// Fatal conditions (structural inconsistency, cancellation) abort
    /// the job; everything else degrades into warnings on the report.
    pub async fn translate_document(
        &self,
        analysis: &DocumentAnalysis,
        cancel: &CancellationToken,
        progress_callback: impl Fn(usize, usize) + Clone + Send + 'static,
    ) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        let job_id = Uuid::new_v4();

        // Single-threaded masking phase over the immutable snapshot.
        let resolver = OverlapResolver::new(
            self.config.pipeline.min_overlap_fraction,
            self.config.pipeline.merge_gap_tolerance,
        );
        let intervals = resolver.resolve(analysis)?;

        let substitution = substitute(&analysis.text, &intervals);
        debug!(
            "Job {}: {} removal intervals, {} placeholders",
            job_id,
            intervals.len(),
            substitution.map.len()
        );

        let boundaries: BTreeSet<usize> = block_boundaries(&analysis.spans)
            .into_iter()
            .map(|b| substitution.offsets.map(b))
            .collect();

        let planner = ChunkPlanner::new(self.config.pipeline.chunk_budget_tokens);
        let chunks = planner.plan(&substitution, &boundaries);
        let chunk_count = chunks.len();

        info!(
            "Job {}: translating {} chunks (~{} tokens, {} figures masked) via {}",
            job_id,
            chunk_count,
            approx_token_cost(&substitution.text),
            substitution.map.len(),
            self.service.backend_name()
        );

        // Concurrent phase: the only suspension point in the pipeline.
        let orchestrator = TranslationOrchestrator::new(self.service.clone());
        let (results, mut warnings) = orchestrator
            .translate_chunks(
                &chunks,
                &self.config.source_language,
                &self.config.target_language,
                cancel,
                progress_callback,
            )
            .await?;

        let failed_chunks = results
            .iter()
            .filter(|r| r.status == ChunkStatus::Failed)
            .count();

        // Deterministic reassembly and final resolution.
        let reassembled = reassemble(&results);
        let document = resolve_placeholders(&reassembled, &substitution.map, &analysis.figures);

        warnings.extend(document.unresolved().map(|outcome| {
            PipelineWarning::UnresolvedPlaceholder {
                token: outcome.token.clone(),
            }
        }));

        let elapsed = started.elapsed();
        info!(
            "Job {}: done in {:.1}s, {} chunks ({} failed), {} warnings",
            job_id,
            elapsed.as_secs_f64(),
            chunk_count,
            failed_chunks,
            warnings.len()
        );

        Ok(PipelineReport {
            job_id,
            document,
            warnings,
            chunk_count,
            failed_chunks,
            elapsed,
        })
    }
}
