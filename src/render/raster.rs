//! Rasterization of display lists with tiny-skia.

use std::fmt;
use std::path::Path;

use tiny_skia::{FillRule as SkiaFillRule, Paint, PathBuilder, Pixmap, Stroke};

use super::transform::ViewTransform;
use crate::error::{Error, Result};
use crate::model::{DisplayItem, DisplayList, FillRule, PathSegment, Rect, Rgba};

/// Greeked glyph bars cover this vertical band of the glyph box.
const GLYPH_BAR_TOP: f32 = 0.3;
const GLYPH_BAR_BOTTOM: f32 = 0.85;
const GLYPH_BAR_ALPHA: u8 = 170;

/// An RGBA pixel buffer produced by the rasterizer.
#[derive(Clone)]
pub struct Raster {
    pixmap: Pixmap,
}

impl Raster {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Color of one pixel, un-premultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba {
            r: c.red(),
            g: c.green(),
            b: c.blue(),
            a: c.alpha(),
        })
    }

    /// Encode the raster as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::RenderFailure(format!("PNG encoding failed: {}", e)))
    }

    /// Encode and write the raster as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let png = self.encode_png()?;
        std::fs::write(path, png)?;
        Ok(())
    }
}

impl fmt::Debug for Raster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Paint `list` into a `width` x `height` pixmap through `transform`.
///
/// The area outside the page box stays transparent.
pub fn rasterize(
    list: &DisplayList,
    transform: &ViewTransform,
    width: u32,
    height: u32,
) -> Result<Raster> {
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        Error::RenderFailure(format!("cannot allocate {}x{} pixmap", width, height))
    })?;
    let ts = transform.to_skia();

    if let Some(page) = tiny_skia::Rect::from_xywh(0.0, 0.0, list.width, list.height) {
        pixmap.fill_rect(page, &paint_for(Rgba::WHITE), ts, None);
    }

    for item in &list.items {
        match item {
            DisplayItem::Path {
                segments,
                fill,
                stroke,
            } => {
                let Some(path) = build_path(segments) else {
                    continue;
                };
                if let Some((color, rule)) = fill {
                    let rule = match rule {
                        FillRule::NonZero => SkiaFillRule::Winding,
                        FillRule::EvenOdd => SkiaFillRule::EvenOdd,
                    };
                    pixmap.fill_path(&path, &paint_for(*color), rule, ts, None);
                }
                if let Some(style) = stroke {
                    let stroke = Stroke {
                        width: style.width.max(0.0),
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint_for(style.color), &stroke, ts, None);
                }
            }
            DisplayItem::Glyphs { bbox, color, .. } => {
                if let Some(bar) = glyph_bar(bbox) {
                    let color = color.with_alpha(GLYPH_BAR_ALPHA);
                    pixmap.fill_rect(bar, &paint_for(color), ts, None);
                }
            }
        }
    }

    log::trace!(
        "Rasterized {} items into {}x{}",
        list.items.len(),
        width,
        height
    );
    Ok(Raster { pixmap })
}

fn paint_for(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn build_path(segments: &[PathSegment]) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for segment in segments {
        match *segment {
            PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
            PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
            PathSegment::CurveTo(c1, c2, p) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathSegment::Close => pb.close(),
        }
    }
    pb.finish()
}

fn glyph_bar(bbox: &Rect) -> Option<tiny_skia::Rect> {
    if bbox.is_empty() {
        return None;
    }
    tiny_skia::Rect::from_xywh(
        bbox.x,
        bbox.y + bbox.height * GLYPH_BAR_TOP,
        bbox.width,
        bbox.height * (GLYPH_BAR_BOTTOM - GLYPH_BAR_TOP),
    )
}
