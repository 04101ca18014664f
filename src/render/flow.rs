//! Line layout for sources without native geometry.

use super::options::RenderOptions;
use crate::model::{Rect, TextRun};
use crate::parser::is_spaceless_script_char;

/// Result of laying out a flowed page in layout units.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowLayout {
    /// One box per run, in run order
    pub boxes: Vec<Rect>,
    /// Page extent including margins
    pub page: Rect,
}

/// Lay out every run as one line.
///
/// Line `i` starts at `margin + i * font_size * line_height`. The trailing
/// line break of a run is not measured, so a bare `"\n"` run gets a
/// zero-width box.
pub fn layout_runs(runs: &[TextRun], options: &RenderOptions) -> FlowLayout {
    let font_size = options.flow_font_size;
    let pitch = font_size * options.line_height;

    let boxes: Vec<Rect> = runs
        .iter()
        .enumerate()
        .map(|(i, run)| {
            let width = measure(&run.text, font_size, options.narrow_advance);
            Rect::new(options.margin, options.margin + i as f32 * pitch, width, font_size)
        })
        .collect();

    let content_width = boxes.iter().map(|b| b.width).fold(0.0, f32::max);
    let page = Rect::new(
        0.0,
        0.0,
        content_width + 2.0 * options.margin,
        runs.len() as f32 * pitch + 2.0 * options.margin,
    );
    FlowLayout { boxes, page }
}

/// Width of `text` without its trailing line break.
pub fn measure(text: &str, font_size: f32, narrow_advance: f32) -> f32 {
    text.strip_suffix('\n')
        .unwrap_or(text)
        .chars()
        .map(|c| {
            if is_wide_char(c) {
                font_size
            } else {
                font_size * narrow_advance
            }
        })
        .sum()
}

/// Characters drawn one em wide: CJK, kana, Hangul, and full-width forms.
fn is_wide_char(c: char) -> bool {
    let code = c as u32;
    is_spaceless_script_char(c)
        // Hangul Syllables, Jamo, and Compatibility Jamo
        || (0xAC00..=0xD7AF).contains(&code)
        || (0x1100..=0x11FF).contains(&code)
        || (0x3130..=0x318F).contains(&code)
        // Halfwidth and Fullwidth Forms (fullwidth part)
        || (0xFF01..=0xFF60).contains(&code)
}
