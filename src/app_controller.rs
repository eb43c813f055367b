use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::errors::PipelineWarning;
use crate::extraction::DocumentAnalysis;
use crate::file_utils::FileManager;
use crate::masking::resolver::{OutputSegment, ResolutionOutcome};
use crate::pipeline::{PipelineReport, TranslationPipeline};
use crate::translation::orchestrator::CancellationToken;

// @module: Application controller for document translation

/// Serialized form of a finished translation job, for the downstream
/// renderer
#[derive(Debug, Serialize)]
struct TranslatedDocumentOutput {
    job_id: String,
    source_language: String,
    target_language: String,
    /// Plain-text rendering with asset refs substituted inline
    text: String,
    /// Reading-order segments for structured consumers
    segments: Vec<OutputSegment>,
    /// Per-placeholder audit
    audit: Vec<ResolutionOutcome>,
    /// Degraded-mode warnings
    warnings: Vec<String>,
    chunk_count: usize,
    failed_chunks: usize,
}

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_language.is_empty()
    }

    /// Run the main workflow over a single analysis file or a directory
    /// of analysis files
    pub async fn run(
        &self,
        input_path: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
    ) -> Result<()> {
        if input_path.is_dir() {
            self.run_folder(input_path, output_dir, force_overwrite).await
        } else {
            let multi_progress = MultiProgress::new();
            self.run_file(&input_path, &output_dir, &multi_progress, force_overwrite)
                .await
        }
    }

    /// Process every analysis file in a directory
    async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: PathBuf,
        force_overwrite: bool,
    ) -> Result<()> {
        let analysis_files = FileManager::find_analysis_files(&input_dir)?;
        if analysis_files.is_empty() {
            return Err(anyhow::anyhow!(
                "No extractor analysis files (.json) found in {:?}",
                input_dir
            ));
        }

        info!("Found {} analysis files to process", analysis_files.len());

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(analysis_files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));

        let mut failures = 0usize;
        for file in &analysis_files {
            folder_pb.set_message(
                file.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );

            if let Err(e) = self
                .run_file(file, &output_dir, &multi_progress, force_overwrite)
                .await
            {
                warn!("Failed to translate {:?}: {}", file, e);
                failures += 1;
            }
            folder_pb.inc(1);
        }
        folder_pb.finish_with_message("Folder processing complete");

        if failures > 0 {
            warn!(
                "{} of {} documents failed to translate",
                failures,
                analysis_files.len()
            );
        }
        Ok(())
    }

    /// Process one analysis file end to end
    async fn run_file(
        &self,
        input_file: &Path,
        output_dir: &Path,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<()> {
        if !input_file.exists() {
            return Err(anyhow::anyhow!("Input file does not exist: {:?}", input_file));
        }

        FileManager::ensure_dir(output_dir)?;

        let output_path = FileManager::generate_output_path(
            input_file,
            output_dir,
            &self.config.target_language,
        );
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(());
        }

        let content = FileManager::read_to_string(input_file)?;
        let analysis = DocumentAnalysis::from_json_str(&content)
            .with_context(|| format!("Failed to parse analysis file {:?}", input_file))?;

        info!(
            "Translating {:?}: {} bytes of text, {} spans, {} figures",
            input_file.file_name().unwrap_or_default(),
            analysis.text.len(),
            analysis.spans.len(),
            analysis.figures.len()
        );

        let report = self
            .translate_with_progress(&analysis, multi_progress)
            .await?;

        self.write_output(&report, &output_path)?;
        info!("Wrote translated document to {:?}", output_path);

        Ok(())
    }

    /// Run the pipeline for one document with a chunk-level progress bar.
    /// Ctrl-C cancels the job; in-flight results are discarded.
    async fn translate_with_progress(
        &self,
        analysis: &DocumentAnalysis,
        multi_progress: &MultiProgress,
    ) -> Result<PipelineReport> {
        let pipeline = TranslationPipeline::new(self.config.clone())?;

        let progress_bar = multi_progress.add(ProgressBar::new(0));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let cancel = CancellationToken::new();
        let signal_cancel = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Cancellation requested, aborting translation job");
                signal_cancel.cancel();
            }
        });

        let pb = progress_bar.clone();
        let report = pipeline
            .translate_document(analysis, &cancel, move |current, total| {
                pb.set_length(total as u64);
                pb.set_position(current as u64);
            })
            .await;
        ctrl_c.abort();

        progress_bar.finish_and_clear();

        let report = report?;
        for warning in &report.warnings {
            match warning {
                PipelineWarning::ChunkTranslationFailure { index, reason } => {
                    warn!("Chunk {} was not translated: {}", index, reason)
                }
                PipelineWarning::UnresolvedPlaceholder { token } => {
                    warn!("Figure placeholder {} was recovered out of place", token)
                }
            }
        }

        Ok(report)
    }

    /// Serialize a pipeline report for the output consumer
    fn write_output(&self, report: &PipelineReport, output_path: &Path) -> Result<()> {
        let output = TranslatedDocumentOutput {
            job_id: report.job_id.to_string(),
            source_language: self.config.source_language.clone(),
            target_language: self.config.target_language.clone(),
            text: report.document.render_text(),
            segments: report.document.segments.clone(),
            audit: report.document.outcomes.clone(),
            warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
            chunk_count: report.chunk_count,
            failed_chunks: report.failed_chunks,
        };

        let content = serde_json::to_string_pretty(&output)?;
        FileManager::write_to_file(output_path, &content)
    }
}
