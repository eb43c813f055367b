/*!
 * Overlap resolution between content spans and figure regions.
 *
 * Text spans whose bounding boxes intersect a figure on the same page are
 * OCR artifacts of that figure, not prose. This module collects their byte
 * ranges as removal candidates and collapses all candidates into sorted,
 * disjoint removal intervals with a single merge sweep.
 */

use log::debug;
use std::collections::BTreeSet;

use crate::errors::PipelineError;
use crate::extraction::{DocumentAnalysis, FigureId};

/// A merged, disjoint range of text to delete because it is OCR noise
/// overlapping one or more figures.
///
/// Invariant: the intervals produced for a document are pairwise
/// non-overlapping and sorted ascending by `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalInterval {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive); equals `start` for synthetic anchors
    pub end: usize,
    /// Every figure whose evidence this interval subsumes
    pub figure_ids: BTreeSet<FigureId>,
}

impl RemovalInterval {
    /// Whether this interval deletes no text (a figure anchor with no
    /// overlapping OCR spans)
    pub fn is_anchor_only(&self) -> bool {
        self.start == self.end
    }
}

/// Candidate removal range tagged with the figure that produced it
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    figure_id: FigureId,
}

/// Computes which content spans must be removed because they overlap a
/// figure, and merges the removal evidence into disjoint intervals.
#[derive(Debug, Clone)]
pub struct OverlapResolver {
    /// Minimum fraction of a span's own area that must be covered by the
    /// figure for the span to count as figure noise. `0.0` means any
    /// non-zero intersection qualifies.
    min_overlap_fraction: f32,

    /// Maximum byte gap between adjacent candidates that is still merged,
    /// provided the gap text is whitespace-only
    merge_gap_tolerance: usize,
}

impl OverlapResolver {
    /// Create a resolver with explicit tuning parameters
    pub fn new(min_overlap_fraction: f32, merge_gap_tolerance: usize) -> Self {
        Self {
            min_overlap_fraction,
            merge_gap_tolerance,
        }
    }

    /// Resolve removal intervals for one document.
    ///
    /// A figure with no overlapping span still yields a zero-length
    /// interval at its extractor-supplied anchor position, so that the
    /// figure gets a placeholder downstream. An anchor outside the text
    /// bounds is a structural inconsistency and aborts the job.
    pub fn resolve(
        &self,
        analysis: &DocumentAnalysis,
    ) -> Result<Vec<RemovalInterval>, PipelineError> {
        analysis.validate()?;

        let mut candidates = Vec::new();

        for figure in &analysis.figures {
            let mut matched = false;

            for span in &analysis.spans {
                if span.page_number != figure.page_number {
                    continue;
                }
                if !self.span_belongs_to_figure(span.bbox.overlap_fraction(&figure.bbox)) {
                    continue;
                }
                candidates.push(Candidate {
                    start: span.offset,
                    end: span.end(),
                    figure_id: figure.id,
                });
                matched = true;
            }

            if !matched {
                // No OCR evidence: the figure's image still needs a
                // placeholder, so anchor a zero-length removal at its
                // figure-order position.
                candidates.push(Candidate {
                    start: figure.anchor_offset,
                    end: figure.anchor_offset,
                    figure_id: figure.id,
                });
            }
        }

        candidates.sort_by_key(|c| (c.start, c.end));

        let merged = self.merge(&analysis.text, candidates);
        debug!(
            "Overlap resolution: {} figures, {} spans -> {} removal intervals",
            analysis.figures.len(),
            analysis.spans.len(),
            merged.len()
        );
        Ok(merged)
    }

    /// Overlap test for one span/figure pair, span-relative
    fn span_belongs_to_figure(&self, overlap_fraction: f32) -> bool {
        if self.min_overlap_fraction <= 0.0 {
            overlap_fraction > 0.0
        } else {
            overlap_fraction >= self.min_overlap_fraction
        }
    }

    /// Single sweep over sorted candidates. A candidate extends the
    /// running interval when it starts inside it, or within the adjacency
    /// tolerance across a whitespace-only gap; otherwise it opens a new
    /// interval. Duplicated candidates (one span overlapping two figures)
    /// collapse here because only the union range matters.
    fn merge(&self, text: &str, candidates: Vec<Candidate>) -> Vec<RemovalInterval> {
        let mut merged: Vec<RemovalInterval> = Vec::new();

        for candidate in candidates {
            if let Some(open) = merged.last_mut() {
                if candidate.start <= open.end
                    || self.bridges_whitespace_gap(text, open.end, candidate.start)
                {
                    open.end = open.end.max(candidate.end);
                    open.figure_ids.insert(candidate.figure_id);
                    continue;
                }
            }

            let mut figure_ids = BTreeSet::new();
            figure_ids.insert(candidate.figure_id);
            merged.push(RemovalInterval {
                start: candidate.start,
                end: candidate.end,
                figure_ids,
            });
        }

        merged
    }

    /// Whether `[from, to)` is a gap the tolerance absorbs
    fn bridges_whitespace_gap(&self, text: &str, from: usize, to: usize) -> bool {
        debug_assert!(to >= from);
        let gap = to - from;
        if gap == 0 || gap > self.merge_gap_tolerance {
            return gap == 0;
        }
        text.get(from..to)
            .map(|s| s.chars().all(char::is_whitespace))
            .unwrap_or(false)
    }
}

impl Default for OverlapResolver {
    fn default() -> Self {
        Self::new(0.0, 2)
    }
}
