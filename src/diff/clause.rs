//! Clause segmentation of a document's linear text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::Document;

/// Default marker grammar: `제N조`, `제N조의M`, `Clause N`, `Article N`,
/// `Section N[.M]` at the start of a line.
pub const DEFAULT_MARKER_PATTERN: &str =
    r"(?m)^[ \t]*(제\s*\d+\s*조(?:의\s*\d+)?|(?i:clause|article|section)\s+\d+(?:\.\d+)*)";

/// Clause marker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClauseConfig {
    /// Multi-line regex matching a clause heading. Capture group 1, when
    /// present, is the label; otherwise the whole match is.
    pub marker_pattern: String,
}

impl Default for ClauseConfig {
    fn default() -> Self {
        Self {
            marker_pattern: DEFAULT_MARKER_PATTERN.to_string(),
        }
    }
}

/// A contiguous unit of text starting at a structural marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    /// Position among the document's clauses
    pub index: usize,
    /// Marker text, `None` for text before the first marker
    pub label: Option<String>,
    /// Heading text following the marker on its line
    pub title: String,
    /// Text after the marker up to the next marker
    pub body: String,
    /// Page holding the clause start
    pub page_index: usize,
    /// Start character offset in the linear text
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
}

impl Clause {
    /// Matching key: the label with whitespace removed, lower-cased.
    pub fn key(&self) -> Option<String> {
        self.label.as_deref().map(label_key)
    }

    /// Heading used for severity classification.
    pub fn heading(&self) -> String {
        match &self.label {
            Some(label) if self.title.is_empty() => label.clone(),
            Some(label) => format!("{} {}", label, self.title),
            None => self.title.clone(),
        }
    }

    pub fn normalized_body(&self) -> String {
        normalize_body(&self.body)
    }
}

/// Splits linear text into clauses.
#[derive(Debug, Clone)]
pub struct ClauseSegmenter {
    marker: Option<Regex>,
}

impl ClauseSegmenter {
    /// Compile a segmenter from configuration.
    pub fn new(config: &ClauseConfig) -> Result<Self> {
        if config.marker_pattern.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "clause marker pattern is empty".to_string(),
            ));
        }
        Ok(Self {
            marker: Some(Regex::new(&config.marker_pattern)?),
        })
    }

    /// Segmenter without markers: the whole text is one unmarked clause.
    pub fn unmarked() -> Self {
        Self { marker: None }
    }

    /// Segment a document, attributing each clause to its start page.
    pub fn segment(&self, doc: &Document) -> Vec<Clause> {
        let mut clauses = self.segment_text(&doc.linear_text());
        for clause in &mut clauses {
            clause.page_index = doc.page_for_offset(clause.start);
        }
        clauses
    }

    /// Segment raw text. Every clause gets page index 0.
    pub fn segment_text(&self, text: &str) -> Vec<Clause> {
        // (byte start, byte end of label, label)
        let markers: Vec<(usize, usize, String)> = match &self.marker {
            Some(re) => re
                .captures_iter(text)
                .filter_map(|caps| {
                    let label = caps.get(1).or_else(|| caps.get(0))?;
                    (!label.as_str().trim().is_empty()).then(|| {
                        (label.start(), label.end(), label.as_str().trim().to_string())
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        let mut clauses = Vec::new();
        let mut offsets = CharOffsets::new(text);

        let preamble_end = markers.first().map_or(text.len(), |m| m.0);
        let preamble = &text[..preamble_end];
        if !preamble.trim().is_empty() {
            clauses.push(Clause {
                index: 0,
                label: None,
                title: String::new(),
                body: preamble.to_string(),
                page_index: 0,
                start: 0,
                end: offsets.at(preamble_end),
            });
        }

        for (i, (start, label_end, label)) in markers.iter().enumerate() {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.0);
            let body = &text[*label_end..end];
            clauses.push(Clause {
                index: clauses.len(),
                label: Some(label.clone()),
                title: title_of(body),
                body: body.to_string(),
                page_index: 0,
                start: offsets.at(*start),
                end: offsets.at(end),
            });
        }
        clauses
    }
}

/// Incremental byte-to-char offset conversion for increasing byte offsets.
struct CharOffsets<'a> {
    text: &'a str,
    byte: usize,
    chars: usize,
}

impl<'a> CharOffsets<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    fn at(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            return self.text[..byte].chars().count();
        }
        self.chars += self.text[self.byte..byte].chars().count();
        self.byte = byte;
        self.chars
    }
}

/// First line after the marker, with a parenthesized title unwrapped.
fn title_of(body: &str) -> String {
    let line = body.lines().next().unwrap_or("").trim();
    let line = line.trim_start_matches([':', '.', '-']).trim();
    let unwrapped = line
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(inner, _)| inner.trim());
    unwrapped.unwrap_or(line).to_string()
}

pub(crate) fn label_key(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// NFC, whitespace runs collapsed to one space, trimmed.
pub fn normalize_body(body: &str) -> String {
    let composed: String = body.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> ClauseSegmenter {
        ClauseSegmenter::new(&ClauseConfig::default()).unwrap()
    }

    #[test]
    fn test_korean_markers() {
        let text = "임대차 계약서\n제1조(목적) 본 계약은\n임대차에 관한 것이다.\n제 2 조 (기간) 2년으로 한다.\n제2조의2 특약\n";
        let clauses = segmenter().segment_text(text);
        assert_eq!(clauses.len(), 4);

        assert_eq!(clauses[0].label, None);
        assert_eq!(clauses[0].body, "임대차 계약서\n");

        assert_eq!(clauses[1].label.as_deref(), Some("제1조"));
        assert_eq!(clauses[1].title, "목적");
        assert_eq!(clauses[1].key().as_deref(), Some("제1조"));

        assert_eq!(clauses[2].label.as_deref(), Some("제 2 조"));
        assert_eq!(clauses[2].key().as_deref(), Some("제2조"));
        assert_eq!(clauses[2].title, "기간");

        assert_eq!(clauses[3].key().as_deref(), Some("제2조의2"));
        assert_eq!(clauses[3].index, 3);
    }

    #[test]
    fn test_english_markers_case_insensitive() {
        let text = "CLAUSE 1: Payment\namount 1000\nSection 2.1 Term\n6 months\n";
        let clauses = segmenter().segment_text(text);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].key().as_deref(), Some("clause1"));
        assert_eq!(clauses[0].title, "Payment");
        assert_eq!(clauses[1].key().as_deref(), Some("section2.1"));
        assert_eq!(clauses[1].heading(), "Section 2.1 Term");
    }

    #[test]
    fn test_marker_must_start_line() {
        let clauses = segmenter().segment_text("see Clause 4 below\n");
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].label.is_none());
    }

    #[test]
    fn test_offsets_are_chars() {
        let text = "전문\n제1조 가\n제2조 나";
        let clauses = segmenter().segment_text(text);
        assert_eq!(clauses[0].start, 0);
        assert_eq!(clauses[0].end, 3);
        assert_eq!(clauses[1].start, 3);
        assert_eq!(clauses[1].end, 9);
        assert_eq!(clauses[2].start, 9);
        assert_eq!(clauses[2].end, text.chars().count());
    }

    #[test]
    fn test_blank_text_has_no_clauses() {
        assert!(segmenter().segment_text(" \n\t").is_empty());
        assert_eq!(ClauseSegmenter::unmarked().segment_text("제1조 x").len(), 1);
    }

    #[test]
    fn test_normalize_body() {
        assert_eq!(normalize_body("  a \n\t b  "), "a b");
        // Decomposed jamo compose to the precomposed syllable
        assert_eq!(normalize_body("\u{1100}\u{1161}"), "\u{AC00}");
    }

    #[test]
    fn test_invalid_pattern() {
        let config = ClauseConfig {
            marker_pattern: "(".to_string(),
        };
        assert!(matches!(
            ClauseSegmenter::new(&config),
            Err(Error::InvalidConfig(_))
        ));
    }
}
