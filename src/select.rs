//! Mapping device-space gestures to text ranges.
//!
//! All functions here are pure: they read a [`RenderedPage`] and never touch
//! controller state.

use serde::Serialize;

use crate::model::{Point, Rect, TextPosition, TextRange};
use crate::render::{OverlaySpan, RenderedPage};

/// A resolved range together with the text it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub range: TextRange,
    pub text: String,
}

/// Resolve a drag from `device_start` to `device_end` into a text range.
///
/// Each point maps to the first span containing it. A point that misses
/// every span snaps to the nearest span, but only when the other point hit
/// one; if both miss, there is no selection. Both ends are returned in
/// [canonical form](canonical_position).
pub fn resolve(rendered: &RenderedPage, device_start: Point, device_end: Point) -> Option<TextRange> {
    let spans = &rendered.overlay_spans;
    let start_hit = containing_span(spans, device_start);
    let end_hit = containing_span(spans, device_end);
    if start_hit.is_none() && end_hit.is_none() {
        return None;
    }

    let start_run = start_hit.or_else(|| nearest_span(spans, device_start))?;
    let end_run = end_hit.or_else(|| nearest_span(spans, device_end))?;

    let start = TextPosition::new(start_run, char_offset(&spans[start_run], device_start));
    let end = TextPosition::new(end_run, char_offset(&spans[end_run], device_end));
    let (start, end) = (canonical(spans, start), canonical(spans, end));
    Some(TextRange::new(rendered.page_index, start, end))
}

/// Like [`resolve`], also returning the selected text.
pub fn resolve_selection(
    rendered: &RenderedPage,
    device_start: Point,
    device_end: Point,
) -> Option<Selection> {
    let range = resolve(rendered, device_start, device_end)?;
    Some(Selection {
        text: range_text(rendered, &range),
        range,
    })
}

/// The characters covered by `range`, across run boundaries.
pub fn range_text(rendered: &RenderedPage, range: &TextRange) -> String {
    let spans = &rendered.overlay_spans;
    let last = range.end_run.min(spans.len().saturating_sub(1));
    let mut text = String::new();

    for run in range.start_run..=last {
        let Some(span) = spans.get(run) else {
            break;
        };
        let from = if run == range.start_run { range.start_offset } else { 0 };
        let to = if run == range.end_run {
            range.end_offset
        } else {
            usize::MAX
        };
        text.extend(span.text.chars().skip(from).take(to.saturating_sub(from)));
    }
    text
}

/// The canonical spelling of a text position.
///
/// The end of a run and the start of the next one denote the same place in
/// the text. Positions at a run's end move forward to the next run's start,
/// skipping empty runs; only the last run keeps an end position.
pub fn canonical_position(rendered: &RenderedPage, position: TextPosition) -> TextPosition {
    canonical(&rendered.overlay_spans, position)
}

/// Device point at a character boundary, vertically centered in the span.
///
/// This is the inverse of the offset mapping used by [`resolve`]: resolving
/// the point gives back the canonical form of `(run, offset)`.
pub fn anchor_point(rendered: &RenderedPage, run: usize, offset: usize) -> Option<Point> {
    let spans = &rendered.overlay_spans;
    spans.get(run)?;
    let position = canonical(spans, TextPosition::new(run, offset));
    let span = &spans[position.run];
    let offset = position.offset;
    let b = span.box_in_device_space;
    Some(Point::new(
        boundary_x(span, offset),
        b.y + b.height / 2.0,
    ))
}

/// One device rectangle per run touched by `range`.
pub fn highlight_rects(rendered: &RenderedPage, range: &TextRange) -> Vec<Rect> {
    rendered
        .overlay_spans
        .iter()
        .enumerate()
        .filter(|(run, _)| range.covers_run(*run))
        .map(|(run, span)| {
            let b = span.box_in_device_space;
            let left = if run == range.start_run {
                boundary_x(span, range.start_offset)
            } else {
                b.x
            };
            let right = if run == range.end_run {
                boundary_x(span, range.end_offset)
            } else {
                b.right()
            };
            Rect::new(left, b.y, (right - left).max(0.0), b.height)
        })
        .collect()
}

fn canonical(spans: &[OverlaySpan], mut position: TextPosition) -> TextPosition {
    while position.run + 1 < spans.len() && position.offset >= spans[position.run].char_count() {
        position = TextPosition::new(position.run + 1, 0);
    }
    position
}

fn containing_span(spans: &[OverlaySpan], p: Point) -> Option<usize> {
    spans
        .iter()
        .position(|span| span.box_in_device_space.contains(p))
}

fn nearest_span(spans: &[OverlaySpan], p: Point) -> Option<usize> {
    spans
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.box_in_device_space
                .distance_to(p)
                .total_cmp(&b.box_in_device_space.distance_to(p))
        })
        .map(|(i, _)| i)
}

fn char_offset(span: &OverlaySpan, p: Point) -> usize {
    let b = span.box_in_device_space;
    let len = span.char_count();
    if b.width <= 0.0 {
        return 0;
    }
    let raw = ((p.x - b.x) / b.width * len as f32).round();
    raw.clamp(0.0, len as f32) as usize
}

fn boundary_x(span: &OverlaySpan, offset: usize) -> f32 {
    let b = span.box_in_device_space;
    let len = span.char_count();
    if len == 0 {
        return b.x;
    }
    b.x + offset.min(len) as f32 / len as f32 * b.width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderStrategy, ViewTransform};

    fn span(i: usize, text: &str, bbox: Rect) -> OverlaySpan {
        OverlaySpan {
            text_run_index: i,
            text: text.to_string(),
            box_in_device_space: bbox,
        }
    }

    fn page() -> RenderedPage {
        RenderedPage {
            page_index: 4,
            scale: 1.0,
            viewport_offset: Point::default(),
            transform: ViewTransform::identity(),
            strategy: RenderStrategy::RasterOverlay,
            raster: None,
            page_box: Rect::new(0.0, 0.0, 300.0, 100.0),
            overlay_spans: vec![
                span(0, "abcdefghij", Rect::new(0.0, 0.0, 100.0, 20.0)),
                span(1, "\n", Rect::new(100.0, 0.0, 0.0, 20.0)),
                span(2, "klmnopqrst", Rect::new(0.0, 30.0, 100.0, 20.0)),
            ],
        }
    }

    #[test]
    fn test_resolve_within_one_span() {
        let rendered = page();
        let range = resolve(&rendered, Point::new(20.0, 10.0), Point::new(51.0, 10.0)).unwrap();
        assert_eq!(range.page_index, 4);
        assert_eq!(range.start(), TextPosition::new(0, 2));
        assert_eq!(range.end(), TextPosition::new(0, 5));
        assert_eq!(range_text(&rendered, &range), "cde");
    }

    #[test]
    fn test_backwards_drag_is_normalized() {
        let rendered = page();
        let selection =
            resolve_selection(&rendered, Point::new(30.0, 40.0), Point::new(80.0, 5.0)).unwrap();
        assert_eq!(selection.range.start(), TextPosition::new(0, 8));
        assert_eq!(selection.range.end(), TextPosition::new(2, 3));
        assert_eq!(selection.text, "ij\nklm");
    }

    #[test]
    fn test_both_points_outside() {
        let rendered = page();
        assert!(resolve(&rendered, Point::new(200.0, 90.0), Point::new(250.0, 95.0)).is_none());
    }

    #[test]
    fn test_miss_snaps_to_nearest_when_other_hits() {
        let rendered = page();
        let range = resolve(&rendered, Point::new(50.0, 10.0), Point::new(150.0, 45.0)).unwrap();
        assert_eq!(range.end(), TextPosition::new(2, 10));
    }

    #[test]
    fn test_shared_edge_resolves_to_next_run_start() {
        let rendered = page();
        let range = resolve(&rendered, Point::new(100.0, 5.0), Point::new(100.0, 15.0)).unwrap();
        // The first span's right edge is the line break's start
        assert_eq!(range.start(), TextPosition::new(1, 0));
        assert!(range.is_collapsed());
    }

    #[test]
    fn test_canonical_position() {
        let rendered = page();
        let canon = |run, offset| canonical_position(&rendered, TextPosition::new(run, offset));
        assert_eq!(canon(0, 4), TextPosition::new(0, 4));
        assert_eq!(canon(0, 10), TextPosition::new(1, 0));
        assert_eq!(canon(1, 1), TextPosition::new(2, 0));
        assert_eq!(canon(2, 10), TextPosition::new(2, 10));
    }

    #[test]
    fn test_zero_width_break_round_trips() {
        let mut rendered = page();
        rendered.overlay_spans = vec![
            span(0, "abc", Rect::new(0.0, 0.0, 30.0, 10.0)),
            span(1, "\n", Rect::new(30.0, 0.0, 0.0, 10.0)),
            span(2, "def", Rect::new(0.0, 12.0, 30.0, 10.0)),
        ];
        let from = anchor_point(&rendered, 1, 0).unwrap();
        let to = anchor_point(&rendered, 2, 2).unwrap();
        let range = resolve(&rendered, from, to).unwrap();
        assert_eq!(range.start(), TextPosition::new(1, 0));
        assert_eq!(range.end(), TextPosition::new(2, 2));
        assert_eq!(range_text(&rendered, &range), "\nde");
    }

    #[test]
    fn test_empty_page() {
        let mut rendered = page();
        rendered.overlay_spans.clear();
        assert!(resolve(&rendered, Point::new(1.0, 1.0), Point::new(2.0, 2.0)).is_none());
    }

    #[test]
    fn test_anchor_round_trip() {
        let rendered = page();
        let a = anchor_point(&rendered, 0, 3).unwrap();
        let b = anchor_point(&rendered, 2, 7).unwrap();
        let range = resolve(&rendered, b, a).unwrap();
        assert_eq!(range.start(), TextPosition::new(0, 3));
        assert_eq!(range.end(), TextPosition::new(2, 7));
    }

    #[test]
    fn test_highlight_rects() {
        let rendered = page();
        let range = TextRange::new(4, TextPosition::new(0, 5), TextPosition::new(2, 2));
        let rects = highlight_rects(&rendered, &range);
        assert_eq!(rects.len(), 3);
        assert_eq!(rects[0], Rect::new(50.0, 0.0, 50.0, 20.0));
        assert_eq!(rects[1], Rect::new(100.0, 0.0, 0.0, 20.0));
        assert_eq!(rects[2], Rect::new(0.0, 30.0, 20.0, 20.0));
    }
}
