/*!
 * Chunk planning for translation requests.
 *
 * The translation engine has a bounded context window, so the processed
 * text is partitioned into chunks measured in an approximate token cost.
 * Chunks never bisect a placeholder token, and prefer to break between
 * top-level structural blocks so headings, tables, and lists travel
 * whole. Concatenating all chunk texts in index order reproduces the
 * processed text exactly.
 */

use log::{debug, error};
use std::collections::BTreeSet;

use crate::extraction::ContentSpan;
use crate::masking::placeholder::{PlaceholderSpan, SubstitutionResult};

/// Rough bytes-per-token heuristic for sizing against the engine's
/// context budget
pub const APPROX_BYTES_PER_TOKEN: usize = 4;

/// Approximate translation cost of a piece of text, in engine tokens
pub fn approx_token_cost(text: &str) -> usize {
    text.len().div_ceil(APPROX_BYTES_PER_TOKEN)
}

/// A bounded-size, placeholder-atomic partition of the processed text.
/// Produced once, consumed once; carries no shared mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in the document; reassembly is by index
    pub index: usize,
    /// Chunk text, a verbatim slice of the processed text
    pub text: String,
    /// Placeholder tokens wholly contained in this chunk
    pub placeholder_tokens: BTreeSet<String>,
}

/// Positions between top-level structural blocks, in original-text
/// coordinates. A paragraph or heading closes a block on its own; table
/// cells and list items only close one when the run of same-kind spans
/// ends, so tables and lists are not split in the middle.
pub fn block_boundaries(spans: &[ContentSpan]) -> Vec<usize> {
    let mut sorted: Vec<&ContentSpan> = spans.iter().collect();
    sorted.sort_by_key(|s| s.offset);

    let mut boundaries = Vec::new();
    for (i, span) in sorted.iter().enumerate() {
        let closes_block = span.kind.is_standalone_block()
            || match sorted.get(i + 1) {
                Some(next) => next.kind != span.kind,
                None => true,
            };
        if closes_block {
            boundaries.push(span.end());
        }
    }
    boundaries
}

/// Splits processed text into translation-sized chunks
#[derive(Debug, Clone)]
pub struct ChunkPlanner {
    /// Budget per chunk, in approximate engine tokens
    budget_units: usize,
}

impl ChunkPlanner {
    /// Create a planner with the given per-chunk token budget
    pub fn new(budget_units: usize) -> Self {
        Self {
            budget_units: budget_units.max(1),
        }
    }

    /// Partition the substitution output into chunks.
    ///
    /// `boundaries` are preferred split points in processed-text
    /// coordinates. Split choice per chunk: the last hard boundary that
    /// fits the budget, else the last whitespace outside any placeholder,
    /// else the nearest placeholder-safe position - atomicity of
    /// placeholders outweighs the budget for a chunk that ends up
    /// slightly oversized.
    pub fn plan(&self, substitution: &SubstitutionResult, boundaries: &BTreeSet<usize>) -> Vec<Chunk> {
        let text = &substitution.text;
        if text.is_empty() {
            return Vec::new();
        }

        let budget_bytes = self.budget_units * APPROX_BYTES_PER_TOKEN;
        let placeholders = &substitution.placeholders;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < text.len() {
            let mut limit = start.saturating_add(budget_bytes).min(text.len());
            if limit >= text.len() {
                chunks.push(self.finish_chunk(chunks.len(), text, start, text.len(), placeholders));
                break;
            }
            while limit > start && !text.is_char_boundary(limit) {
                limit -= 1;
            }
            if limit <= start {
                // Budget smaller than one character; take the character.
                limit = next_char_boundary(text, start + 1);
            }

            let split = self.choose_split(text, start, limit, boundaries, placeholders);
            chunks.push(self.finish_chunk(chunks.len(), text, start, split, placeholders));
            start = split;
        }

        let reassembled: usize = chunks.iter().map(|c| c.text.len()).sum();
        if reassembled != text.len() {
            error!(
                "CRITICAL ERROR: Lost text during chunk planning! Processed: {} bytes, chunked: {} bytes",
                text.len(),
                reassembled
            );
        }
        debug!(
            "Chunk plan: {} chunks, budget {} tokens, {} placeholders",
            chunks.len(),
            self.budget_units,
            placeholders.len()
        );

        chunks
    }

    fn choose_split(
        &self,
        text: &str,
        start: usize,
        limit: usize,
        boundaries: &BTreeSet<usize>,
        placeholders: &[PlaceholderSpan],
    ) -> usize {
        // Preferred: the last hard boundary inside the budget.
        if let Some(&boundary) = boundaries
            .range(start + 1..=limit)
            .filter(|&&b| !inside_placeholder(placeholders, b))
            .next_back()
        {
            return boundary;
        }

        // Fallback: the last whitespace outside any placeholder.
        for (rel, ch) in text[start..limit].char_indices().rev() {
            if !ch.is_whitespace() {
                continue;
            }
            let split = start + rel + ch.len_utf8();
            if split > start && split < text.len() && !inside_placeholder(placeholders, split) {
                return split;
            }
        }

        // No safe break inside the budget: take the nearest position
        // that does not bisect a placeholder.
        if let Some(ph) = placeholders
            .iter()
            .find(|p| p.start < limit && limit < p.end)
        {
            if ph.start > start {
                return ph.start;
            }
            return ph.end;
        }
        limit
    }

    fn finish_chunk(
        &self,
        index: usize,
        text: &str,
        start: usize,
        end: usize,
        placeholders: &[PlaceholderSpan],
    ) -> Chunk {
        let placeholder_tokens = placeholders
            .iter()
            .filter(|p| p.start >= start && p.end <= end)
            .map(|p| p.token.clone())
            .collect();
        Chunk {
            index,
            text: text[start..end].to_string(),
            placeholder_tokens,
        }
    }
}

fn inside_placeholder(placeholders: &[PlaceholderSpan], pos: usize) -> bool {
    placeholders.iter().any(|p| p.start < pos && pos < p.end)
}

fn next_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos.min(text.len())
}
