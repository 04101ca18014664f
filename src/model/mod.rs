//! Document model types.
//!
//! This module defines the addressable content model every source format is
//! extracted into. Geometry is kept in page-native units; device space only
//! appears once a page is rendered.

mod display;
mod document;
mod geometry;
mod page;
mod range;

pub use display::{
    DisplayItem, DisplayList, DisplayListSource, FillRule, PathSegment, RasterSource, Rgba,
    StrokeStyle,
};
pub use document::{Document, DocumentId, Metadata, SourceFormat};
pub use geometry::{Point, Rect};
pub use page::{Page, TextRun};
pub use range::{TextPosition, TextRange};
