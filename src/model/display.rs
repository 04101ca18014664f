//! Vector description of a paginated page, resolved lazily for rasterization.

use std::fmt;
use std::sync::Arc;

use super::{Point, Rect};
use crate::error::Result;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from unit-interval components.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgb(to_byte(r), to_byte(g), to_byte(b))
    }

    /// Naive CMYK to RGB conversion.
    pub fn from_cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        let k = k.clamp(0.0, 1.0);
        Self::from_unit(
            (1.0 - c.clamp(0.0, 1.0)) * (1.0 - k),
            (1.0 - m.clamp(0.0, 1.0)) * (1.0 - k),
            (1.0 - y.clamp(0.0, 1.0)) * (1.0 - k),
        )
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// One segment of a path, in page-native top-left coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    Close,
}

/// Stroke parameters of a painted path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f32,
}

/// Whether fills use the nonzero or even-odd rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// A painted element of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    /// A filled and/or stroked path.
    Path {
        segments: Vec<PathSegment>,
        fill: Option<(Rgba, FillRule)>,
        stroke: Option<StrokeStyle>,
    },
    /// Visible text, carried as the box its glyphs occupy.
    Glyphs {
        bbox: Rect,
        baseline: f32,
        font_size: f32,
        color: Rgba,
    },
}

/// Everything needed to paint one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    /// Page width in page-native units.
    pub width: f32,
    /// Page height in page-native units.
    pub height: f32,
    /// Items in paint order.
    pub items: Vec<DisplayItem>,
}

impl DisplayList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, item: DisplayItem) {
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Producer of a page's display list, implemented by paginated backends.
pub trait DisplayListSource: Send + Sync {
    fn display_list(&self) -> Result<DisplayList>;
}

/// Lazily-resolvable handle to a page's visual description.
///
/// Nothing is decoded until [`RasterSource::resolve`] is called, which keeps
/// large documents cheap to extract.
#[derive(Clone)]
pub struct RasterSource {
    source: Arc<dyn DisplayListSource>,
}

impl RasterSource {
    pub fn new(source: Arc<dyn DisplayListSource>) -> Self {
        Self { source }
    }

    /// Decode the page into a display list.
    pub fn resolve(&self) -> Result<DisplayList> {
        self.source.display_list()
    }
}

impl fmt::Debug for RasterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSource").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(DisplayList);

    impl DisplayListSource for Fixed {
        fn display_list(&self) -> Result<DisplayList> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(Rgba::from_unit(1.0, 0.0, 0.5), Rgba::rgb(255, 0, 128));
        assert_eq!(Rgba::from_cmyk(0.0, 0.0, 0.0, 1.0), Rgba::BLACK);
        assert_eq!(Rgba::from_cmyk(0.0, 0.0, 0.0, 0.0), Rgba::WHITE);
    }

    #[test]
    fn test_raster_source_resolves_lazily() {
        let mut list = DisplayList::new(100.0, 50.0);
        list.push(DisplayItem::Glyphs {
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
            baseline: 8.0,
            font_size: 10.0,
            color: Rgba::BLACK,
        });
        let source = RasterSource::new(Arc::new(Fixed(list.clone())));
        assert_eq!(source.resolve().unwrap(), list);
    }
}
