/*!
 * Placeholder resolution over translated output.
 *
 * Translation engines are asked to echo placeholder tokens verbatim, but
 * they do not always comply: brackets get dropped, punctuation shifts,
 * case changes. The resolver re-scans the reassembled output with a
 * tolerant recognizer, maps every recovered figure id back to its asset,
 * and appends any figure whose token vanished entirely, so an image is
 * never lost even when it ends up misplaced.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::extraction::{AssetRef, FigureId, FigureRegion};
use crate::masking::placeholder::{figure_token, PlaceholderMap};

/// Placeholder-like token, tolerant of surface drift introduced by the
/// translation engine: optional or altered brackets, spacing around the
/// delimiter, case changes, and swapped separator punctuation. The
/// embedded figure id is what actually matters.
static TOLERANT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[<⟨«‹]{0,2}\s*DOC[\s_\-]?FIG\s*[:：#\-]?\s*(\d{1,10})\s*[>⟩»›]{0,2}")
        .expect("tolerant token regex")
});

/// Final audit record for one placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    /// Token as recorded in the mapping, or the drifted surface form for
    /// tokens that could not be mapped
    pub token: String,
    /// Figure id embedded in the token
    pub figure_id: FigureId,
    /// Whether the placeholder was substituted at its position in the text
    pub resolved: bool,
}

/// One piece of the final document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSegment {
    /// Translated prose
    Text(String),
    /// A figure reference substituted for a placeholder
    Figure {
        /// Figure id
        figure_id: FigureId,
        /// Asset handle for the downstream renderer
        asset_ref: AssetRef,
    },
}

/// The resolver's output: final segments plus the per-placeholder audit
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedDocument {
    /// Document segments in reading order; recovered figures come last
    pub segments: Vec<OutputSegment>,
    /// One record per placeholder plus one per unmappable token
    pub outcomes: Vec<ResolutionOutcome>,
}

impl ResolvedDocument {
    /// Render the document as plain text, figures shown as their asset refs
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                OutputSegment::Text(text) => out.push_str(text),
                OutputSegment::Figure { asset_ref, .. } => out.push_str(&asset_ref.0),
            }
        }
        out
    }

    /// Tokens that could not be substituted in place
    pub fn unresolved(&self) -> impl Iterator<Item = &ResolutionOutcome> {
        self.outcomes.iter().filter(|o| !o.resolved)
    }
}

/// Scan translated text for placeholder-like tokens and substitute each
/// figure's asset reference at its position.
///
/// Recognized tokens whose figure id is in the mapping become figure
/// segments. A recognized token with an unknown id indicates upstream
/// corruption: the surface text is kept and audited, never silently
/// dropped. A mapping entry that never appears in the output at all is
/// recovered by appending its figure at the end of the document. A token
/// the engine duplicated substitutes only once; later copies are removed
/// so no figure is ever emitted twice.
pub fn resolve_placeholders(
    translated: &str,
    map: &PlaceholderMap,
    figures: &[FigureRegion],
) -> ResolvedDocument {
    let mut segments = Vec::new();
    let mut outcomes = Vec::new();
    let mut placed: HashSet<FigureId> = HashSet::new();
    let mut cursor = 0usize;

    for caps in TOLERANT_TOKEN_RE.captures_iter(translated) {
        let whole = caps.get(0).expect("match");
        let id_digits = caps.get(1).expect("figure id group").as_str();
        let Ok(raw_id) = id_digits.parse::<u32>() else {
            continue;
        };
        let figure_id = FigureId(raw_id);

        let known = map.get(&figure_token(figure_id)).is_some();
        let asset = figures.iter().find(|f| f.id == figure_id);

        match (known, asset) {
            (true, Some(figure)) => {
                push_text(&mut segments, &translated[cursor..whole.start()]);
                if placed.insert(figure_id) {
                    segments.push(OutputSegment::Figure {
                        figure_id,
                        asset_ref: figure.asset_ref.clone(),
                    });
                    outcomes.push(ResolutionOutcome {
                        token: figure_token(figure_id),
                        figure_id,
                        resolved: true,
                    });
                } else {
                    warn!("Duplicate placeholder for figure {} removed", figure_id);
                }
                cursor = whole.end();
            }
            _ => {
                // Unknown id: upstream corruption. Keep the surface text
                // in place and record it in the audit.
                push_text(&mut segments, &translated[cursor..whole.end()]);
                outcomes.push(ResolutionOutcome {
                    token: whole.as_str().to_string(),
                    figure_id,
                    resolved: false,
                });
                cursor = whole.end();
            }
        }
    }

    push_text(&mut segments, &translated[cursor..]);

    // Placeholders the engine dropped entirely: append the figures at the
    // end of the document rather than lose them.
    for (token, figure_id) in map.iter() {
        if placed.contains(&figure_id) {
            continue;
        }
        if let Some(figure) = figures.iter().find(|f| f.id == figure_id) {
            warn!(
                "Placeholder {} missing from translated output; appending figure {}",
                token, figure_id
            );
            segments.push(OutputSegment::Figure {
                figure_id,
                asset_ref: figure.asset_ref.clone(),
            });
        }
        outcomes.push(ResolutionOutcome {
            token: token.to_string(),
            figure_id,
            resolved: false,
        });
    }

    ResolvedDocument { segments, outcomes }
}

fn push_text(segments: &mut Vec<OutputSegment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(OutputSegment::Text(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(OutputSegment::Text(text.to_string()));
    }
}
