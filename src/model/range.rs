//! Document-relative text ranges.

use serde::{Deserialize, Serialize};

/// A character position within a page: run index plus offset into the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TextPosition {
    pub run: usize,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(run: usize, offset: usize) -> Self {
        Self { run, offset }
    }
}

/// A selection on one page, always normalized so start precedes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub page_index: usize,
    pub start_run: usize,
    pub start_offset: usize,
    pub end_run: usize,
    pub end_offset: usize,
}

impl TextRange {
    /// Build a range from two positions in any order.
    pub fn new(page_index: usize, a: TextPosition, b: TextPosition) -> Self {
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Self {
            page_index,
            start_run: start.run,
            start_offset: start.offset,
            end_run: end.run,
            end_offset: end.offset,
        }
    }

    pub fn start(&self) -> TextPosition {
        TextPosition::new(self.start_run, self.start_offset)
    }

    pub fn end(&self) -> TextPosition {
        TextPosition::new(self.end_run, self.end_offset)
    }

    /// Whether the range selects no characters.
    pub fn is_collapsed(&self) -> bool {
        self.start() == self.end()
    }

    /// Whether the range touches the given run.
    pub fn covers_run(&self, run: usize) -> bool {
        run >= self.start_run && run <= self.end_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalizes_order() {
        let range = TextRange::new(0, TextPosition::new(3, 1), TextPosition::new(1, 4));
        assert_eq!(range.start(), TextPosition::new(1, 4));
        assert_eq!(range.end(), TextPosition::new(3, 1));
        assert!(range.covers_run(2));
        assert!(!range.covers_run(4));
    }

    #[test]
    fn test_same_run_orders_by_offset() {
        let range = TextRange::new(2, TextPosition::new(0, 9), TextPosition::new(0, 2));
        assert_eq!((range.start_offset, range.end_offset), (2, 9));
        assert!(!range.is_collapsed());
    }
}
