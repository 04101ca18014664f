//! Content stream interpretation for paginated pages.
//!
//! A page's content stream is walked once while tracking the graphics and
//! text state. The walk yields positioned text spans (the source of text
//! runs) and a display list of painted shapes (the source of the raster).
//! Everything leaving this module is in page-native top-left space.

use std::collections::HashMap;

use super::backend::{BackendFontInfo, ContentOp, FontMetrics, PageId, PdfBackend, PdfValue};
use crate::error::Result;
use crate::model::{
    DisplayItem, DisplayList, FillRule, PathSegment, Point, Rect, Rgba, StrokeStyle, TextRun,
};

/// Fraction of the font size above the baseline.
const ASCENT: f32 = 0.8;
/// Fraction of the font size below the baseline.
const DESCENT: f32 = 0.2;
/// TJ adjustment (1/1000 em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// A text span with position and font information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position of the left edge
    pub x: f32,
    /// Baseline Y position (top-left origin)
    pub baseline: f32,
    /// Advance width of the span
    pub width: f32,
    /// Effective font size
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl TextSpan {
    /// Top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.baseline - self.font_size * ASCENT
    }

    /// Bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.baseline + self.font_size * DESCENT
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bounding box in page-native units.
    pub fn bbox(&self) -> Rect {
        Rect::new(self.x, self.top(), self.width, self.font_size * (ASCENT + DESCENT))
    }

    fn avg_char_width(&self) -> f32 {
        let chars = self.text.chars().count();
        if chars > 0 && self.width > 0.0 {
            self.width / chars as f32
        } else {
            self.font_size * 0.5
        }
    }
}

/// Everything extracted from one pass over a page's content.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Text spans in content stream order
    pub spans: Vec<TextSpan>,
    /// Painted shapes and glyph boxes
    pub display: DisplayList,
}

/// Interpret a page's content stream.
pub fn interpret_page(backend: &dyn PdfBackend, page: PageId) -> Result<PageContent> {
    let bounds = backend.page_bounds(page);
    let fonts = super::backend::font_table(backend.page_fonts(page)?);
    let content = backend.page_content(page)?;
    let ops = if content.is_empty() {
        Vec::new()
    } else {
        backend.decode_content(&content)?
    };

    let mut interpreter = ContentInterpreter::new(backend, page, bounds, fonts);
    for op in &ops {
        interpreter.apply(op);
    }
    log::trace!(
        "page {:?}: {} ops, {} spans, {} display items",
        page,
        ops.len(),
        interpreter.spans.len(),
        interpreter.display.items.len()
    );
    Ok(PageContent {
        spans: interpreter.spans,
        display: interpreter.display,
    })
}

/// A 2D affine transform in PDF row-vector convention: `p' = p × M`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32, // X translation
    f: f32, // Y translation
}

impl Matrix {
    const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translate(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    fn from_operands(v: &[f32]) -> Option<Self> {
        match v {
            [a, b, c, d, e, f, ..] => Some(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix::new(
            self.a * other.a + self.b * other.c,
            self.a * other.b + self.b * other.d,
            self.c * other.a + self.d * other.c,
            self.c * other.b + self.d * other.d,
            self.e * other.a + self.f * other.c + other.e,
            self.e * other.b + self.f * other.d + other.f,
        )
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit Y vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Geometric mean scale, used for line widths.
    fn mean_scale(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f32,
    word_spacing: f32,
    h_scale: f32,
    leading: f32,
    rise: f32,
    render_mode: i64,
    font: Vec<u8>,
    font_size: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
            font: Vec::new(),
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    fill: Rgba,
    stroke: Rgba,
    line_width: f32,
    text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            fill: Rgba::BLACK,
            stroke: Rgba::BLACK,
            line_width: 1.0,
            text: TextState::default(),
        }
    }
}

enum ShowItem<'b> {
    Text(&'b [u8]),
    Adjust(f32),
}

struct ContentInterpreter<'a> {
    backend: &'a dyn PdfBackend,
    page: PageId,
    /// MediaBox in user space
    bounds: Rect,
    fonts: HashMap<Vec<u8>, BackendFontInfo>,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    path: Vec<PathSegment>,
    current_point: Point,
    spans: Vec<TextSpan>,
    display: DisplayList,
}

impl<'a> ContentInterpreter<'a> {
    fn new(
        backend: &'a dyn PdfBackend,
        page: PageId,
        bounds: Rect,
        fonts: HashMap<Vec<u8>, BackendFontInfo>,
    ) -> Self {
        Self {
            backend,
            page,
            bounds,
            fonts,
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            path: Vec::new(),
            current_point: Point::default(),
            spans: Vec::new(),
            display: DisplayList::new(bounds.width, bounds.height),
        }
    }

    /// Convert a user-space point to page-native top-left space.
    fn to_page(&self, x: f32, y: f32) -> Point {
        Point::new(x - self.bounds.x, self.bounds.bottom() - y)
    }

    fn user_point(&self, x: f32, y: f32) -> Point {
        let (ux, uy) = self.state.ctm.apply(x, y);
        self.to_page(ux, uy)
    }

    fn apply(&mut self, op: &ContentOp) {
        match op.operator.as_str() {
            // Graphics state
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = op.numbers().as_deref().and_then(Matrix::from_operands) {
                    self.state.ctm = m.then(&self.state.ctm);
                }
            }
            "w" => {
                if let Some(w) = op.number(0) {
                    self.state.line_width = w;
                }
            }

            // Color
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Some(color) = color_from_operands(op) {
                    self.state.fill = color;
                }
            }
            "G" | "RG" | "K" | "SC" | "SCN" => {
                if let Some(color) = color_from_operands(op) {
                    self.state.stroke = color;
                }
            }
            "cs" => self.state.fill = Rgba::BLACK,
            "CS" => self.state.stroke = Rgba::BLACK,

            // Path construction
            "m" => {
                if let (Some(x), Some(y)) = (op.number(0), op.number(1)) {
                    let p = self.user_point(x, y);
                    self.path.push(PathSegment::MoveTo(p));
                    self.current_point = p;
                }
            }
            "l" => {
                if let (Some(x), Some(y)) = (op.number(0), op.number(1)) {
                    let p = self.user_point(x, y);
                    self.path.push(PathSegment::LineTo(p));
                    self.current_point = p;
                }
            }
            "c" | "v" | "y" => self.curve(op),
            "re" => {
                if let Some([x, y, w, h]) = op.numbers().as_deref().and_then(|v| v.get(..4)) {
                    let corners = [(*x, *y), (x + w, *y), (x + w, y + h), (*x, y + h)];
                    let points: Vec<Point> =
                        corners.iter().map(|(cx, cy)| self.user_point(*cx, *cy)).collect();
                    self.path.push(PathSegment::MoveTo(points[0]));
                    for p in &points[1..] {
                        self.path.push(PathSegment::LineTo(*p));
                    }
                    self.path.push(PathSegment::Close);
                    self.current_point = points[0];
                }
            }
            "h" => self.path.push(PathSegment::Close),

            // Path painting
            "S" => self.paint(false, None, true),
            "s" => self.paint(true, None, true),
            "f" | "F" => self.paint(false, Some(FillRule::NonZero), false),
            "f*" => self.paint(false, Some(FillRule::EvenOdd), false),
            "B" => self.paint(false, Some(FillRule::NonZero), true),
            "B*" => self.paint(false, Some(FillRule::EvenOdd), true),
            "b" => self.paint(true, Some(FillRule::NonZero), true),
            "b*" => self.paint(true, Some(FillRule::EvenOdd), true),
            "n" => self.path.clear(),

            // Text objects and state
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    self.state.text.font = name.clone();
                }
                if let Some(size) = op.number(1) {
                    self.state.text.font_size = size;
                }
            }
            "Tc" => self.set_text_param(op, |t, v| t.char_spacing = v),
            "Tw" => self.set_text_param(op, |t, v| t.word_spacing = v),
            "Tz" => self.set_text_param(op, |t, v| t.h_scale = v / 100.0),
            "TL" => self.set_text_param(op, |t, v| t.leading = v),
            "Ts" => self.set_text_param(op, |t, v| t.rise = v),
            "Tr" => {
                if let Some(PdfValue::Integer(mode)) = op.operands.first() {
                    self.state.text.render_mode = *mode;
                }
            }

            // Text positioning
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (op.number(0), op.number(1)) {
                    if op.operator == "TD" {
                        self.state.text.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = op.numbers().as_deref().and_then(Matrix::from_operands) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),

            // Text showing
            "Tj" => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = op.operands.first() {
                    let items: Vec<ShowItem<'_>> = arr
                        .iter()
                        .filter_map(|item| match item {
                            PdfValue::Str(bytes) => Some(ShowItem::Text(bytes)),
                            PdfValue::Integer(n) => Some(ShowItem::Adjust(*n as f32)),
                            PdfValue::Real(n) => Some(ShowItem::Adjust(*n)),
                            _ => None,
                        })
                        .collect();
                    self.show(&items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            "\"" => {
                if let (Some(aw), Some(ac)) = (op.number(0), op.number(1)) {
                    self.state.text.word_spacing = aw;
                    self.state.text.char_spacing = ac;
                }
                self.next_line();
                if let Some(PdfValue::Str(bytes)) = op.operands.get(2) {
                    self.show(&[ShowItem::Text(bytes)]);
                }
            }
            _ => {}
        }
    }

    fn set_text_param(&mut self, op: &ContentOp, set: impl FnOnce(&mut TextState, f32)) {
        if let Some(v) = op.number(0) {
            set(&mut self.state.text, v);
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translate(tx, ty).then(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn curve(&mut self, op: &ContentOp) {
        let Some(v) = op.numbers() else { return };
        let points: Vec<Point> = v
            .chunks_exact(2)
            .map(|c| self.user_point(c[0], c[1]))
            .collect();
        let segment = match (op.operator.as_str(), points.as_slice()) {
            ("c", [c1, c2, end]) => PathSegment::CurveTo(*c1, *c2, *end),
            ("v", [c2, end]) => PathSegment::CurveTo(self.current_point, *c2, *end),
            ("y", [c1, end]) => PathSegment::CurveTo(*c1, *end, *end),
            _ => return,
        };
        if let PathSegment::CurveTo(_, _, end) = segment {
            self.current_point = end;
        }
        self.path.push(segment);
    }

    fn paint(&mut self, close: bool, fill: Option<FillRule>, stroke: bool) {
        let mut segments = std::mem::take(&mut self.path);
        if segments.is_empty() {
            return;
        }
        if close {
            segments.push(PathSegment::Close);
        }
        let stroke = stroke.then(|| StrokeStyle {
            color: self.state.stroke,
            width: (self.state.line_width * self.state.ctm.mean_scale()).max(0.0),
        });
        self.display.push(DisplayItem::Path {
            segments,
            fill: fill.map(|rule| (self.state.fill, rule)),
            stroke,
        });
    }

    fn show(&mut self, items: &[ShowItem<'_>]) {
        let text_state = self.state.text.clone();
        let font = self.fonts.get(&text_state.font);
        let metrics = font.map(|f| f.metrics.clone()).unwrap_or_default();
        let font_name = font
            .map(|f| f.base_font.clone())
            .unwrap_or_else(|| String::from_utf8_lossy(&text_state.font).to_string());

        let size = text_state.font_size;
        let h_scale = text_state.h_scale;
        let mut text = String::new();
        let mut advance = 0.0_f32;

        for item in items {
            match item {
                ShowItem::Text(bytes) => {
                    text.push_str(&self.backend.decode_text(self.page, &text_state.font, bytes));
                    advance += string_advance(&metrics, &text_state, bytes);
                }
                ShowItem::Adjust(n) => {
                    advance -= n / 1000.0 * size * h_scale;
                    // Large negative adjustments stand in for word spaces
                    if -n > TJ_SPACE_THRESHOLD {
                        if let Some(last) = text.chars().last() {
                            if !last.is_whitespace() && !is_spaceless_script_char(last) {
                                text.push(' ');
                            }
                        }
                    }
                }
            }
        }

        let rendering = self.text_matrix.then(&self.state.ctm);
        let (x0, y0) = rendering.apply(0.0, text_state.rise);
        let (x1, _) = rendering.apply(advance, text_state.rise);
        self.text_matrix = Matrix::translate(advance, 0.0).then(&self.text_matrix);

        if text.trim().is_empty() {
            return;
        }

        let start = self.to_page(x0.min(x1), y0);
        let span = TextSpan {
            text,
            x: start.x,
            baseline: start.y,
            width: (x1 - x0).abs(),
            font_size: size * rendering.vertical_scale(),
            font_name,
        };

        // Modes 3 and 7 paint nothing (OCR text layers)
        if !matches!(text_state.render_mode, 3 | 7) {
            self.display.push(DisplayItem::Glyphs {
                bbox: span.bbox(),
                baseline: span.baseline,
                font_size: span.font_size,
                color: self.state.fill,
            });
        }
        self.spans.push(span);
    }
}

/// Horizontal advance of a string operand in unscaled text space.
fn string_advance(metrics: &FontMetrics, text: &TextState, bytes: &[u8]) -> f32 {
    metrics
        .codes(bytes)
        .into_iter()
        .map(|code| {
            let glyph = metrics.width(code) / 1000.0 * text.font_size;
            let word = if !metrics.two_byte && code == 32 {
                text.word_spacing
            } else {
                0.0
            };
            (glyph + text.char_spacing + word) * text.h_scale
        })
        .sum()
}

fn color_from_operands(op: &ContentOp) -> Option<Rgba> {
    let values: Vec<f32> = op
        .operands
        .iter()
        .filter_map(super::backend::get_number_from_value)
        .collect();
    match values.as_slice() {
        [gray] => Some(Rgba::from_unit(*gray, *gray, *gray)),
        [r, g, b] => Some(Rgba::from_unit(*r, *g, *b)),
        [c, m, y, k] => Some(Rgba::from_cmyk(*c, *m, *y, *k)),
        _ => None,
    }
}

/// Group spans into lines and emit text runs in reading order.
///
/// Lines are ordered top-to-bottom and spans within a line left-to-right.
/// A `" "` run fills visible gaps between spans and every line ends with a
/// zero-width `"\n"` run, so the runs concatenate into the page's text.
pub fn build_runs(spans: Vec<TextSpan>) -> Vec<TextRun> {
    let mut runs = Vec::new();
    for line in group_lines(spans) {
        let top = line.iter().map(TextSpan::top).fold(f32::INFINITY, f32::min);
        let bottom = line
            .iter()
            .map(TextSpan::bottom)
            .fold(f32::NEG_INFINITY, f32::max);
        let baseline = line[0].baseline;
        let font_size = line[0].font_size;

        for (i, span) in line.iter().enumerate() {
            if i > 0 {
                let prev = &line[i - 1];
                if needs_space(prev, span) {
                    let gap = Rect::new(prev.right(), top, span.x - prev.right(), bottom - top);
                    runs.push(TextRun::new(" ", gap, baseline, font_size));
                }
            }
            runs.push(TextRun::new(
                span.text.clone(),
                span.bbox(),
                span.baseline,
                span.font_size,
            ));
        }

        let right = line.iter().map(TextSpan::right).fold(f32::NEG_INFINITY, f32::max);
        runs.push(TextRun::new(
            "\n",
            Rect::new(right, top, 0.0, bottom - top),
            baseline,
            font_size,
        ));
    }
    runs
}

fn group_lines(mut spans: Vec<TextSpan>) -> Vec<Vec<TextSpan>> {
    spans.sort_by(|a, b| {
        a.baseline
            .partial_cmp(&b.baseline)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<TextSpan>> = Vec::new();
    for span in spans {
        let joins_last = lines.last().is_some_and(|line| {
            let anchor = &line[0];
            let tolerance = anchor.font_size.max(span.font_size).max(1.0) * 0.3;
            (span.baseline - anchor.baseline).abs() <= tolerance
        });
        match lines.last_mut() {
            Some(line) if joins_last => line.push(span),
            _ => lines.push(vec![span]),
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }
    lines
}

/// Whether a space run belongs between two adjacent spans on a line.
fn needs_space(prev: &TextSpan, span: &TextSpan) -> bool {
    let gap = span.x - prev.right();
    if gap <= span.avg_char_width() * 0.2 {
        return false;
    }

    let prev_last = prev.text.chars().last();
    let curr_first = span.text.chars().next();
    if prev_last.is_some_and(char::is_whitespace) || curr_first.is_some_and(char::is_whitespace)
    {
        return false;
    }

    let both_spaceless = prev_last.is_some_and(is_spaceless_script_char)
        && curr_first.is_some_and(is_spaceless_script_char);
    !both_spaceless
}

/// Check if character is from a script that doesn't use word spaces.
/// Chinese and Japanese don't use spaces between words, but Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // CJK Unified Ideographs Extension B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana and Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::backend::decode_text_simple;
    use std::collections::BTreeMap;

    /// Backend serving a fixed operation list for a single page.
    struct ScriptBackend {
        ops: Vec<ContentOp>,
        fonts: Vec<BackendFontInfo>,
    }

    impl PdfBackend for ScriptBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            BTreeMap::from([(1, (1, 0))])
        }
        fn page_bounds(&self, _page: PageId) -> Rect {
            Rect::new(0.0, 0.0, 200.0, 100.0)
        }
        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(self.fonts.clone())
        }
        fn page_content(&self, _page: PageId) -> Result<Vec<u8>> {
            Ok(b"script".to_vec())
        }
        fn decode_content(&self, _data: &[u8]) -> Result<Vec<ContentOp>> {
            Ok(self.ops.clone())
        }
        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            decode_text_simple(bytes)
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn num(v: f32) -> PdfValue {
        PdfValue::Real(v)
    }

    fn text(s: &str) -> PdfValue {
        PdfValue::Str(s.as_bytes().to_vec())
    }

    fn font(width: f32) -> BackendFontInfo {
        BackendFontInfo {
            name: b"F1".to_vec(),
            base_font: "Helvetica".to_string(),
            metrics: FontMetrics {
                first_char: 32,
                widths: vec![width; 95],
                default_width: width,
                two_byte: false,
            },
        }
    }

    fn run_script(ops: Vec<ContentOp>) -> PageContent {
        let backend = ScriptBackend {
            ops,
            fonts: vec![font(500.0)],
        };
        interpret_page(&backend, (1, 0)).unwrap()
    }

    #[test]
    fn test_span_position_and_width() {
        let content = run_script(vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
            op("Td", vec![num(20.0), num(80.0)]),
            op("Tj", vec![text("Hello")]),
            op("ET", vec![]),
        ]);

        assert_eq!(content.spans.len(), 1);
        let span = &content.spans[0];
        assert_eq!(span.text, "Hello");
        assert_eq!(span.x, 20.0);
        // baseline flipped into top-left space: 100 - 80
        assert_eq!(span.baseline, 20.0);
        // five glyphs at 500/1000 em of 10pt
        assert_eq!(span.width, 25.0);
        assert_eq!(span.font_size, 10.0);
        assert_eq!(content.display.items.len(), 1);
    }

    #[test]
    fn test_text_matrix_advances_between_shows() {
        let content = run_script(vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
            op("Tm", vec![num(1.0), num(0.0), num(0.0), num(1.0), num(10.0), num(50.0)]),
            op("Tj", vec![text("ab")]),
            op("Tj", vec![text("cd")]),
            op("ET", vec![]),
        ]);
        assert_eq!(content.spans[0].x, 10.0);
        assert_eq!(content.spans[1].x, 20.0);
    }

    #[test]
    fn test_ctm_scales_text() {
        let content = run_script(vec![
            op("q", vec![]),
            op("cm", vec![num(2.0), num(0.0), num(0.0), num(2.0), num(0.0), num(0.0)]),
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
            op("Td", vec![num(5.0), num(10.0)]),
            op("Tj", vec![text("ab")]),
            op("ET", vec![]),
            op("Q", vec![]),
        ]);
        let span = &content.spans[0];
        assert_eq!(span.x, 10.0);
        assert_eq!(span.baseline, 80.0);
        assert_eq!(span.font_size, 20.0);
        assert_eq!(span.width, 20.0);
    }

    #[test]
    fn test_leading_and_next_line() {
        let content = run_script(vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
            op("TL", vec![num(14.0)]),
            op("Td", vec![num(0.0), num(90.0)]),
            op("Tj", vec![text("one")]),
            op("T*", vec![]),
            op("Tj", vec![text("two")]),
            op("ET", vec![]),
        ]);
        assert_eq!(content.spans[0].baseline, 10.0);
        assert_eq!(content.spans[1].baseline, 24.0);
        assert_eq!(content.spans[1].x, 0.0);
    }

    #[test]
    fn test_tj_kerning_inserts_space() {
        let content = run_script(vec![
            op("BT", vec![]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
            op(
                "TJ",
                vec![PdfValue::Array(vec![
                    text("Clause"),
                    PdfValue::Integer(-300),
                    text("3"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(content.spans[0].text, "Clause 3");
        // 7 glyphs * 5 + 3pt kerning
        assert_eq!(content.spans[0].width, 38.0);
    }

    #[test]
    fn test_invisible_text_is_extracted_but_not_painted() {
        let content = run_script(vec![
            op("BT", vec![]),
            op("Tr", vec![PdfValue::Integer(3)]),
            op("Tf", vec![PdfValue::Name(b"F1".to_vec()), num(10.0)]),
            op("Tj", vec![text("ocr")]),
            op("ET", vec![]),
        ]);
        assert_eq!(content.spans.len(), 1);
        assert!(content.display.is_empty());
    }

    #[test]
    fn test_paths_and_colors() {
        let content = run_script(vec![
            op("rg", vec![num(1.0), num(0.0), num(0.0)]),
            op("re", vec![num(10.0), num(10.0), num(20.0), num(5.0)]),
            op("f", vec![]),
            op("w", vec![num(2.0)]),
            op("m", vec![num(0.0), num(0.0)]),
            op("l", vec![num(100.0), num(0.0)]),
            op("S", vec![]),
            op("m", vec![num(0.0), num(0.0)]),
            op("n", vec![]),
        ]);

        assert_eq!(content.display.items.len(), 2);
        match &content.display.items[0] {
            DisplayItem::Path {
                segments,
                fill,
                stroke,
            } => {
                assert_eq!(segments[0], PathSegment::MoveTo(Point::new(10.0, 90.0)));
                assert_eq!(segments.len(), 5);
                assert_eq!(*fill, Some((Rgba::rgb(255, 0, 0), FillRule::NonZero)));
                assert!(stroke.is_none());
            }
            other => panic!("unexpected item {:?}", other),
        }
        match &content.display.items[1] {
            DisplayItem::Path { stroke, fill, .. } => {
                assert!(fill.is_none());
                assert_eq!(stroke.map(|s| s.width), Some(2.0));
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    fn span(text: &str, x: f32, baseline: f32, width: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            baseline,
            width,
            font_size: 10.0,
            font_name: "Helvetica".to_string(),
        }
    }

    #[test]
    fn test_build_runs_orders_lines_and_inserts_breaks() {
        let spans = vec![
            span("second", 0.0, 40.0, 30.0),
            span("world", 40.0, 20.0, 25.0),
            span("hello", 0.0, 20.5, 25.0),
        ];
        let runs = build_runs(spans);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", " ", "world", "\n", "second", "\n"]);

        let space = &runs[1];
        assert_eq!(space.bbox.x, 25.0);
        assert_eq!(space.bbox.width, 15.0);
        let line_break = &runs[3];
        assert_eq!(line_break.bbox.width, 0.0);
        assert_eq!(line_break.bbox.x, 65.0);
    }

    #[test]
    fn test_build_runs_no_space_for_adjacent_spans() {
        let runs = build_runs(vec![span("ab", 0.0, 10.0, 10.0), span("cd", 10.0, 10.0, 10.0)]);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", "cd", "\n"]);
    }

    #[test]
    fn test_build_runs_no_space_between_cjk() {
        let runs = build_runs(vec![span("合同", 0.0, 10.0, 20.0), span("条款", 30.0, 10.0, 20.0)]);
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn test_is_spaceless_script_char() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('カ'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('A'));
    }
}
