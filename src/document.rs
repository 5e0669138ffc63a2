//! Document data model: pages, text blocks, candidates, and highlights.
//!
//! All geometry uses page-point coordinates with the origin at the top-left
//! corner of the page, matching what the extractor reports. The annotator is
//! the only component that converts back into PDF-native bottom-left
//! coordinates, right before writing overlay objects.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page points, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// A rectangle with no area cannot carry a visible overlay.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// A page-region text excerpt with its bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block text, non-empty after trimming.
    pub text: String,
    pub bbox: BBox,
}

/// One extracted page: 1-based number, page extent, ordered text blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// 1-based, dense and contiguous across the document.
    pub number: usize,
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    pub blocks: Vec<TextBlock>,
}

/// A block chosen for LLM insight generation.
///
/// The page's full block list (needed only by the legacy containment
/// resolver) is reachable through the orchestrator's page map keyed by
/// `page_number`.
#[derive(Debug, Clone)]
pub struct ParagraphCandidate {
    pub page_number: usize,
    pub text: String,
}

/// The model's reply for one candidate, before highlight resolution.
///
/// Both fields may be empty: a failed or unparseable model call degrades to
/// an empty result rather than aborting the batch.
#[derive(Debug, Clone)]
pub struct InsightResult {
    pub page_number: usize,
    pub insight_text: String,
    /// Verbatim phrases the model nominated for highlighting, in reply order.
    pub raw_highlights: Vec<String>,
}

/// A highlight phrase resolved to a concrete rectangle on its page.
///
/// `text` is always the originally requested phrase, never the truncated or
/// keyword anchor the resolver may have used internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedHighlight {
    pub text: String,
    pub bbox: BBox,
}
