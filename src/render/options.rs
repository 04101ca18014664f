//! Rendering options and configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::config::EngineConfig;

/// Options for rendering pages.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Allowed scale range; requests outside it are clamped
    pub scale_bounds: ScaleBounds,

    /// Base font size for flow layout, in layout units
    pub flow_font_size: f32,

    /// Line pitch for flow layout, as a multiple of the font size
    pub line_height: f32,

    /// Margin around flow-laid content, in layout units
    pub margin: f32,

    /// Advance of narrow (non-CJK) characters, as a fraction of an em
    pub narrow_advance: f32,

    /// Largest pixmap edge the rasterizer will allocate
    pub max_raster_dimension: u32,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying the scale bounds of an engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new().with_scale_bounds(config.scale)
    }

    /// Set the scale bounds.
    pub fn with_scale_bounds(mut self, bounds: ScaleBounds) -> Self {
        self.scale_bounds = bounds;
        self
    }

    /// Set the flow-layout font size.
    pub fn with_flow_font_size(mut self, size: f32) -> Self {
        self.flow_font_size = size;
        self
    }

    /// Set the flow-layout line height multiplier.
    pub fn with_line_height(mut self, multiplier: f32) -> Self {
        self.line_height = multiplier;
        self
    }

    /// Set the flow-layout margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the maximum pixmap dimension.
    pub fn with_max_raster_dimension(mut self, max: u32) -> Self {
        self.max_raster_dimension = max;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale_bounds: ScaleBounds::default(),
            flow_font_size: 12.0,
            line_height: 1.5,
            margin: 36.0,
            narrow_advance: 0.55,
            max_raster_dimension: 16384,
        }
    }
}

/// Closed range of accepted render scales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleBounds {
    pub min: f32,
    pub max: f32,
}

impl ScaleBounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp a requested scale. Non-finite or non-positive requests map to `min`.
    ///
    /// Invalid bounds behave like the defaults.
    pub fn clamp(&self, scale: f32) -> f32 {
        let bounds = if self.is_valid() { *self } else { Self::default() };
        if !scale.is_finite() || scale <= 0.0 {
            return bounds.min;
        }
        scale.clamp(bounds.min, bounds.max)
    }

    /// Whether both bounds are positive, finite, and ordered.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min <= self.max
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self { min: 0.5, max: 2.0 }
    }
}

/// Page selection for batch rendering.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Selected 0-based page indices out of `page_count` pages.
    pub fn indices(&self, page_count: usize) -> Vec<usize> {
        (0..page_count)
            .filter(|&index| self.includes(index as u32 + 1))
            .collect()
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            let (start, end) = match part.split_once('-') {
                Some((start, end)) => (start.trim(), end.trim()),
                None => (part, part),
            };
            let start: u32 = start.parse().map_err(|_| "Invalid page number")?;
            let end: u32 = end.parse().map_err(|_| "Invalid page number")?;
            pages.extend(start..=end);
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
