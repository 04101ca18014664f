//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the content interpreter.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::model::Rect;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Width used for glyphs a font does not describe, in 1/1000 em.
pub const FALLBACK_GLYPH_WIDTH: f32 = 500.0;

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// Glyph advance metrics.
    pub metrics: FontMetrics,
}

/// Glyph advances of a font, in 1/1000 text space units.
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// First character code covered by `widths`.
    pub first_char: u32,
    /// Advances for codes `first_char..first_char + widths.len()`.
    pub widths: Vec<f32>,
    /// Advance for codes outside `widths`.
    pub default_width: f32,
    /// Whether character codes are two bytes wide (Type0 fonts).
    pub two_byte: bool,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            default_width: FALLBACK_GLYPH_WIDTH,
            two_byte: false,
        }
    }
}

impl FontMetrics {
    /// Split a string operand into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        if self.two_byte {
            bytes
                .chunks(2)
                .map(|c| match c {
                    [hi, lo] => u32::from(*hi) << 8 | u32::from(*lo),
                    [single] => u32::from(*single),
                    _ => 0,
                })
                .collect()
        } else {
            bytes.iter().map(|&b| u32::from(b)).collect()
        }
    }

    /// Advance of a character code in 1/1000 text space units.
    pub fn width(&self, code: u32) -> f32 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Numeric operand at `index`.
    pub fn number(&self, index: usize) -> Option<f32> {
        self.operands.get(index).and_then(get_number_from_value)
    }

    /// All operands as numbers, or `None` if any is not numeric.
    pub fn numbers(&self) -> Option<Vec<f32>> {
        self.operands.iter().map(get_number_from_value).collect()
    }
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, font info, content stream
/// decoding, and text decoding, without exposing any concrete PDF library
/// types. Backends are shared between pages rendered on worker threads.
pub trait PdfBackend: Send + Sync {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's MediaBox in PDF user space (origin bottom-left).
    fn page_bounds(&self, page: PageId) -> Rect;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object};

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        if doc.is_encrypted() {
            return Err(Error::CorruptInput(
                "encrypted PDF documents are not supported".to_string(),
            ));
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    ///
    /// Escape hatch for metadata not covered by `PdfBackend`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn font_metrics(&self, font: &Dictionary) -> FontMetrics {
        let subtype = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or(&b""[..]);

        if subtype == b"Type0" {
            // CID fonts: only the descendant's default width is honored
            let default_width = font
                .get(b"DescendantFonts")
                .ok()
                .map(|o| self.resolve(o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| self.resolve(o))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get(b"DW").ok())
                .and_then(|o| o.as_float().ok())
                .unwrap_or(1000.0);
            return FontMetrics {
                first_char: 0,
                widths: Vec::new(),
                default_width,
                two_byte: true,
            };
        }

        let first_char = font
            .get(b"FirstChar")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);
        let widths = font
            .get(b"Widths")
            .ok()
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| self.resolve(w).as_float().unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        FontMetrics {
            first_char,
            widths,
            default_width: FALLBACK_GLYPH_WIDTH,
            two_byte: false,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_bounds(&self, page: PageId) -> Rect {
        let media_box = self
            .doc
            .get_dictionary(page)
            .ok()
            .and_then(|dict| dict.get(b"MediaBox").ok())
            .map(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .filter(|arr| arr.len() >= 4)
            .map(|arr| {
                arr.iter()
                    .map(|v| self.resolve(v).as_float().unwrap_or(0.0))
                    .collect::<Vec<f32>>()
            });

        match media_box {
            Some(b) => {
                let (x0, x1) = (b[0].min(b[2]), b[0].max(b[2]));
                let (y0, y1) = (b[1].min(b[3]), b[1].max(b[3]));
                Rect::new(x0, y0, x1 - x0, y1 - y0)
            }
            // Default to Letter size
            None => Rect::new(0.0, 0.0, 612.0, 792.0),
        }
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::CorruptInput(e.to_string()))?;

        let mut result = Vec::with_capacity(lopdf_fonts.len());
        for (name, font_dict) in &lopdf_fonts {
            let base_font = font_dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            result.push(BackendFontInfo {
                name: name.clone(),
                base_font,
                metrics: self.font_metrics(font_dict),
            });
        }
        Ok(result)
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::CorruptInput(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        match self.resolve(contents) {
            Object::Stream(s) => Ok(s
                .decompressed_content()
                .unwrap_or_else(|_| s.content.clone())),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Stream(s) = self.resolve(obj) {
                        match s.decompressed_content() {
                            Ok(data) => content.extend_from_slice(&data),
                            Err(_) => content.extend_from_slice(&s.content),
                        }
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::CorruptInput("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)
            .map_err(|e| Error::CorruptInput(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

/// Index fonts by resource name for the interpreter.
pub fn font_table(fonts: Vec<BackendFontInfo>) -> HashMap<Vec<u8>, BackendFontInfo> {
    fonts.into_iter().map(|f| (f.name.clone(), f)).collect()
}
