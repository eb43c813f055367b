/*!
 * Structural masking pipeline.
 *
 * Figures embedded in a document must never travel through the text
 * translator. This module removes the OCR artifacts that extractors
 * produce over figure regions and stands placeholder tokens in for the
 * figures, then recovers the figures after translation:
 *
 * - `overlap`: decide which content spans are figure noise and merge the
 *   removal evidence into disjoint intervals
 * - `placeholder`: rewrite the text, one placeholder token per figure
 * - `resolver`: find placeholder tokens in translated output (tolerant
 *   of format drift) and substitute figure assets back
 */

pub use self::overlap::{OverlapResolver, RemovalInterval};
pub use self::placeholder::{
    figure_token, PlaceholderMap, PlaceholderSpan, SubstitutionResult, substitute,
};
pub use self::resolver::{resolve_placeholders, OutputSegment, ResolutionOutcome, ResolvedDocument};

pub mod overlap;
pub mod placeholder;
pub mod resolver;
