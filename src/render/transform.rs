//! Page-native to device-space mapping.

use serde::{Deserialize, Serialize};

use crate::model::{Point, Rect};

/// Uniform scale followed by a translation: `T(p) = p * scale + offset`.
///
/// The raster and the text overlay of a rendered page are both produced
/// from the same instance, so they stay aligned at every zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Point,
}

impl ViewTransform {
    pub fn new(scale: f32, offset: Point) -> Self {
        Self { scale, offset }
    }

    pub fn identity() -> Self {
        Self::new(1.0, Point::default())
    }

    pub fn apply_point(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.offset.x,
            p.y * self.scale + self.offset.y,
        )
    }

    pub fn apply_rect(&self, r: Rect) -> Rect {
        let origin = self.apply_point(Point::new(r.x, r.y));
        Rect::new(origin.x, origin.y, r.width * self.scale, r.height * self.scale)
    }

    /// Map a device point back to page-native space.
    pub fn invert_point(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset.x) / self.scale,
            (p.y - self.offset.y) / self.scale,
        )
    }

    pub fn invert_rect(&self, r: Rect) -> Rect {
        let origin = self.invert_point(Point::new(r.x, r.y));
        Rect::new(origin.x, origin.y, r.width / self.scale, r.height / self.scale)
    }

    /// The same mapping as a tiny-skia transform.
    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.scale,
            0.0,
            0.0,
            self.scale,
            self.offset.x,
            self.offset.y,
        )
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}
