//! Points and rectangles shared by page-native and device space.

use serde::{Deserialize, Serialize};

/// A 2D point. Y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corner points in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the rectangle covers no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Inclusive containment test, so points on shared edges hit both boxes.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Euclidean distance from the point to the nearest box edge; zero inside.
    pub fn distance_to(&self, p: Point) -> f32 {
        let dx = if p.x < self.x {
            self.x - p.x
        } else if p.x > self.right() {
            p.x - self.right()
        } else {
            0.0
        };
        let dy = if p.y < self.y {
            self.y - p.y
        } else if p.y > self.bottom() {
            p.y - self.bottom()
        } else {
            0.0
        };
        (dx * dx + dy * dy).sqrt()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    /// Approximate equality, used when comparing transformed boxes.
    pub fn approx_eq(&self, other: &Rect, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_edges() {
        let r = Rect::new(0.0, 0.0, 100.0, 20.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(100.0, 20.0)));
        assert!(!r.contains(Point::new(100.5, 10.0)));
    }

    #[test]
    fn test_distance_to() {
        let r = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert_eq!(r.distance_to(Point::new(15.0, 15.0)), 0.0);
        assert_eq!(r.distance_to(Point::new(25.0, 15.0)), 5.0);
        assert_eq!(r.distance_to(Point::new(23.0, 24.0)), 5.0);
    }

    #[test]
    fn test_union_and_corners() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 20.0, 10.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 15.0, 25.0));

        let r = Rect::from_corners(Point::new(10.0, 2.0), Point::new(4.0, 8.0));
        assert_eq!(r, Rect::new(4.0, 2.0, 6.0, 6.0));
    }
}
