/*!
 * Placeholder substitution over removal intervals.
 *
 * Rewrites the extracted text in one linear pass: unaffected text is
 * copied verbatim, each removal interval is deleted, and one placeholder
 * token per covered figure is inserted at the interval's position. The
 * resulting token map lives exactly as long as one translation job.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::extraction::FigureId;
use crate::masking::overlap::RemovalInterval;

/// Fixed sentinel prefix of every placeholder token
pub const SENTINEL_PREFIX: &str = "<<DOC_FIG:";
/// Fixed sentinel suffix of every placeholder token
pub const SENTINEL_SUFFIX: &str = ">>";
/// Zero-padded width of the figure id inside a token
pub const FIGURE_ID_WIDTH: usize = 4;

/// Canonical token form, e.g. `<<DOC_FIG:0007>>`
pub static CANONICAL_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<DOC_FIG:(\d{1,10})>>").expect("canonical token regex"));

/// Render the canonical placeholder token for a figure
pub fn figure_token(id: FigureId) -> String {
    format!("{}{:0width$}{}", SENTINEL_PREFIX, id.0, SENTINEL_SUFFIX, width = FIGURE_ID_WIDTH)
}

/// One placeholder occurrence in the processed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpan {
    /// Canonical token text
    pub token: String,
    /// Figure the token stands in for
    pub figure_id: FigureId,
    /// Start byte offset in the processed text
    pub start: usize,
    /// End byte offset in the processed text (exclusive)
    pub end: usize,
}

/// Token -> figure mapping for one translation job.
///
/// Built once, single-threaded, before any concurrent dispatch begins,
/// and read-only afterwards. It must not be reused across documents.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderMap {
    /// Tokens in insertion (monotonic) order
    entries: Vec<(String, FigureId)>,
    /// Reverse lookup
    by_token: HashMap<String, FigureId>,
}

impl PlaceholderMap {
    fn insert(&mut self, token: String, figure_id: FigureId) {
        self.by_token.insert(token.clone(), figure_id);
        self.entries.push((token, figure_id));
    }

    /// Figure for a canonical token, if the token belongs to this job
    pub fn get(&self, token: &str) -> Option<FigureId> {
        self.by_token.get(token).copied()
    }

    /// Tokens with their figures, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, FigureId)> {
        self.entries.iter().map(|(t, id)| (t.as_str(), *id))
    }

    /// Number of placeholders in the map
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the document has no figures at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One deletion the substitution performed, in both coordinate systems
#[derive(Debug, Clone, Copy)]
struct Cut {
    orig_start: usize,
    orig_end: usize,
    /// Position in the processed text right after the inserted tokens
    processed_end: usize,
}

/// Maps byte positions in the original text to positions in the
/// processed text, so structural boundaries survive the rewrite.
#[derive(Debug, Clone, Default)]
pub struct OffsetMap {
    cuts: Vec<Cut>,
}

impl OffsetMap {
    /// Map an original-text position to the processed text.
    ///
    /// Positions inside a deleted range map to the position right after
    /// that range's placeholder tokens, which is always a legal split
    /// point for the chunk planner.
    pub fn map(&self, orig: usize) -> usize {
        // Cuts are sorted by orig_start; find the last cut at or before orig.
        let idx = self.cuts.partition_point(|c| c.orig_start <= orig);
        if idx == 0 {
            return orig;
        }
        let cut = &self.cuts[idx - 1];
        if orig >= cut.orig_end {
            cut.processed_end + (orig - cut.orig_end)
        } else {
            cut.processed_end
        }
    }
}

/// Output of one substitution pass
#[derive(Debug, Clone, Default)]
pub struct SubstitutionResult {
    /// Rewritten text with placeholder tokens in place of figure noise
    pub text: String,
    /// Placeholder occurrences, ascending by `start`
    pub placeholders: Vec<PlaceholderSpan>,
    /// Token -> figure mapping
    pub map: PlaceholderMap,
    /// Original-to-processed offset mapping
    pub offsets: OffsetMap,
}

/// Rewrite `text` by deleting each removal interval and inserting one
/// placeholder token per covered figure, ascending by figure id.
///
/// Intervals must be sorted and disjoint (the overlap resolver's output
/// invariant). Offsets are computed against the original text exactly
/// once; a single copy-cursor pass suffices. A figure referenced by more
/// than one interval gets its token at the first interval only, so no
/// two placeholders ever share a token.
pub fn substitute(text: &str, intervals: &[RemovalInterval]) -> SubstitutionResult {
    debug_assert!(
        intervals.windows(2).all(|w| w[0].end <= w[1].start),
        "removal intervals must be sorted and disjoint"
    );

    let mut out = String::with_capacity(text.len());
    let mut placeholders = Vec::new();
    let mut map = PlaceholderMap::default();
    let mut cuts = Vec::with_capacity(intervals.len());
    let mut emitted: HashSet<FigureId> = HashSet::new();
    let mut cursor = 0usize;

    for interval in intervals {
        out.push_str(&text[cursor..interval.start]);

        for &figure_id in &interval.figure_ids {
            if !emitted.insert(figure_id) {
                continue;
            }
            let token = figure_token(figure_id);
            let start = out.len();
            out.push_str(&token);
            placeholders.push(PlaceholderSpan {
                token: token.clone(),
                figure_id,
                start,
                end: out.len(),
            });
            map.insert(token, figure_id);
        }

        cuts.push(Cut {
            orig_start: interval.start,
            orig_end: interval.end,
            processed_end: out.len(),
        });
        cursor = interval.end;
    }

    out.push_str(&text[cursor..]);

    SubstitutionResult {
        text: out,
        placeholders,
        map,
        offsets: OffsetMap { cuts },
    }
}
