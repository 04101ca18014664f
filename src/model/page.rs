//! Page-level types.

use super::{RasterSource, Rect};
use serde::{Deserialize, Serialize};

/// A run of text with its position on the page.
///
/// Boxes are in page-native units (points for paginated sources) with a
/// top-left origin. Flowed and plain-text runs carry a zero box because
/// their layout is computed at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content, possibly a single `"\n"` line break
    pub text: String,

    /// Bounding box in page-native units
    pub bbox: Rect,

    /// Baseline Y coordinate in page-native units
    pub baseline: f32,

    /// Font size in page-native units (0 when unknown)
    pub font_size: f32,
}

impl TextRun {
    /// Create a positioned text run.
    pub fn new(text: impl Into<String>, bbox: Rect, baseline: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            baseline,
            font_size,
        }
    }

    /// Create a run without native layout.
    pub fn unpositioned(text: impl Into<String>) -> Self {
        Self::new(text, Rect::default(), 0.0, 0.0)
    }

    /// Number of characters (Unicode scalar values) in the run.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether this run is only a line break.
    pub fn is_line_break(&self) -> bool {
        self.text == "\n"
    }
}

/// A single renderable page.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Page index (0-based)
    pub index: usize,

    /// Page width in page-native units (0 until laid out for flowed sources)
    pub width: f32,

    /// Page height in page-native units
    pub height: f32,

    /// Handle to the page's vector description (paginated sources only)
    #[serde(skip)]
    pub raster_source: Option<RasterSource>,

    /// Text runs in reading order
    pub text_runs: Vec<TextRun>,
}

impl Page {
    /// Create a new page with the given dimensions.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            raster_source: None,
            text_runs: Vec::new(),
        }
    }

    /// Create a page without native dimensions (flowed or plain text).
    pub fn flowed(index: usize) -> Self {
        Self::new(index, 0.0, 0.0)
    }

    /// Attach a raster source.
    pub fn with_raster_source(mut self, source: RasterSource) -> Self {
        self.raster_source = Some(source);
        self
    }

    /// Attach text runs.
    pub fn with_runs(mut self, runs: Vec<TextRun>) -> Self {
        self.text_runs = runs;
        self
    }

    /// Linear text of the page: the concatenation of its runs.
    pub fn linear_text(&self) -> String {
        self.text_runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Number of characters in the page's linear text.
    pub fn char_count(&self) -> usize {
        self.text_runs.iter().map(TextRun::char_count).sum()
    }

    /// Get page dimensions as (width, height) tuple.
    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// Check if the page is in landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}
