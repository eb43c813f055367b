/*!
 * Document analysis data model and extractor boundary.
 *
 * The structural extractor is an external collaborator: given raw document
 * bytes it produces a single linear text representation plus content spans
 * (byte ranges with structural kinds and page geometry) and figure regions.
 * This module defines that boundary contract, the format-sniffing dispatch
 * over document formats, and validation of the extractor's invariants.
 */

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::PipelineError;

/// Page-relative axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width, must be non-negative
    pub width: f32,
    /// Height, must be non-negative
    pub height: f32,
}

impl BoundingBox {
    /// Create a bounding box from its left-top corner and dimensions
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Area of the box
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Area of the intersection with another box, 0.0 when disjoint
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        if right <= left || bottom <= top {
            return 0.0;
        }
        (right - left) * (bottom - top)
    }

    /// Fraction of this box's area covered by the intersection with `other`.
    ///
    /// A degenerate (zero-area) box never overlaps anything.
    pub fn overlap_fraction(&self, other: &BoundingBox) -> f32 {
        let own = self.area();
        if own <= 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / own
    }
}

/// Structural kind of an extracted content span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Paragraph,
    Heading,
    TableCell,
    ListItem,
}

impl SpanKind {
    /// Whether a span of this kind closes a top-level block on its own.
    ///
    /// Table cells and list items only close a block when the run of
    /// same-kind spans ends; the chunk planner uses this to avoid
    /// splitting inside tables and lists.
    pub fn is_standalone_block(&self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading)
    }
}

/// A byte-offset range of extracted document text with structural kind
/// and page position. Immutable once extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSpan {
    /// Byte offset into the linear text
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Structural kind
    pub kind: SpanKind,
    /// 1-based page number
    pub page_number: u32,
    /// Page-relative geometry
    pub bbox: BoundingBox,
}

impl ContentSpan {
    /// End of the span's byte range (exclusive)
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Stable, document-scoped figure identifier assigned by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FigureId(pub u32);

impl fmt::Display for FigureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to stored image bytes, resolved by the external asset
/// store before the pipeline runs. The pipeline only carries it through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(pub String);

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A detected image area on a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureRegion {
    /// Stable figure id
    pub id: FigureId,
    /// 1-based page number
    pub page_number: u32,
    /// Page-relative geometry
    pub bbox: BoundingBox,
    /// Figure-order anchor position in the linear text, supplied by the
    /// extractor. Used when no OCR span overlaps the figure.
    pub anchor_offset: usize,
    /// Handle to the stored image bytes
    pub asset_ref: AssetRef,
}

/// The extractor's complete output for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    /// Single linear text representation of the document
    pub text: String,
    /// Extracted content spans, byte offsets into `text`
    pub spans: Vec<ContentSpan>,
    /// Detected figure regions
    pub figures: Vec<FigureRegion>,
}

impl DocumentAnalysis {
    /// Validate the extractor's invariants before the pipeline touches
    /// anything: span ranges and figure anchors must be valid byte
    /// positions in `text`, on char boundaries, and boxes must not have
    /// negative dimensions. Violations are fatal and propagated as
    /// [`PipelineError::StructuralInconsistency`], never clamped.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let len = self.text.len();

        for (i, span) in self.spans.iter().enumerate() {
            let end = span.offset.checked_add(span.length).ok_or_else(|| {
                PipelineError::StructuralInconsistency(format!(
                    "span {} range overflows usize",
                    i
                ))
            })?;
            if end > len {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "span {} range [{}, {}) exceeds text length {}",
                    i, span.offset, end, len
                )));
            }
            if !self.text.is_char_boundary(span.offset) || !self.text.is_char_boundary(end) {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "span {} range [{}, {}) splits a UTF-8 character",
                    i, span.offset, end
                )));
            }
            if span.bbox.width < 0.0 || span.bbox.height < 0.0 {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "span {} has negative bounding-box dimensions",
                    i
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for figure in &self.figures {
            if !seen.insert(figure.id) {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "duplicate figure id {}",
                    figure.id
                )));
            }
            if figure.anchor_offset > len {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "figure {} anchor {} lies outside text of length {}",
                    figure.id, figure.anchor_offset, len
                )));
            }
            if !self.text.is_char_boundary(figure.anchor_offset) {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "figure {} anchor {} splits a UTF-8 character",
                    figure.id, figure.anchor_offset
                )));
            }
            if figure.bbox.width < 0.0 || figure.bbox.height < 0.0 {
                return Err(PipelineError::StructuralInconsistency(format!(
                    "figure {} has negative bounding-box dimensions",
                    figure.id
                )));
            }
        }

        Ok(())
    }

    /// Parse an analysis file produced by a detached extractor run
    pub fn from_json_str(content: &str) -> Result<Self> {
        let analysis: DocumentAnalysis = serde_json::from_str(content)?;
        Ok(analysis)
    }

    /// Serialize for handoff to the output consumer or for fixtures
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Supported source document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Word,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Word => write!(f, "word"),
        }
    }
}

/// Sniff the document format from magic bytes.
///
/// PDF files start with `%PDF-`; Word (docx) files are ZIP containers
/// starting with `PK`. Selection happens here at the boundary, one
/// analyzer variant per format.
pub fn sniff_format(bytes: &[u8]) -> Option<DocumentFormat> {
    if bytes.starts_with(b"%PDF-") {
        Some(DocumentFormat::Pdf)
    } else if bytes.starts_with(b"PK\x03\x04") {
        Some(DocumentFormat::Word)
    } else {
        None
    }
}

/// Capability to produce the (spans, figures) shape from raw document
/// bytes. Implemented per format by external extraction collaborators;
/// the pipeline itself never parses document binaries.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyze raw document bytes into a linear text plus spans/figures
    async fn analyze(&self, bytes: &[u8]) -> Result<DocumentAnalysis>;

    /// The format this analyzer handles
    fn format(&self) -> DocumentFormat;
}

/// Pick the analyzer matching the sniffed format of `bytes`
pub fn select_analyzer<'a>(
    bytes: &[u8],
    analyzers: &'a [Box<dyn DocumentAnalyzer>],
) -> Option<&'a dyn DocumentAnalyzer> {
    let format = sniff_format(bytes)?;
    analyzers
        .iter()
        .find(|a| a.format() == format)
        .map(|a| a.as_ref())
}
