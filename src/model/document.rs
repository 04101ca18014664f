//! Document-level types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Page;
use crate::error::{Error, Result};

/// Opaque document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The family a document was extracted from.
///
/// Extraction and rendering both match on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Fixed-layout pages with native geometry (PDF)
    Paginated,
    /// Word-processor text without native layout (DOCX)
    Flowed,
    /// Plain text
    PlainText,
}

impl SourceFormat {
    /// Whether pages carry native geometry and a raster source.
    pub fn is_paginated(&self) -> bool {
        matches!(self, SourceFormat::Paginated)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Paginated => "paginated",
            SourceFormat::Flowed => "flowed",
            SourceFormat::PlainText => "plain text",
        };
        f.write_str(name)
    }
}

/// An extracted document. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    id: DocumentId,
    source_format: SourceFormat,
    metadata: Metadata,
    pages: Vec<Page>,
}

impl Document {
    /// Build a document from its pages.
    ///
    /// Fails if `pages` is empty or page indices are not `0..n` in order.
    pub fn new(source_format: SourceFormat, pages: Vec<Page>, mut metadata: Metadata) -> Result<Self> {
        if pages.is_empty() {
            return Err(Error::CorruptInput("document has no pages".to_string()));
        }
        if let Some((position, page)) = pages
            .iter()
            .enumerate()
            .find(|(position, page)| page.index != *position)
        {
            return Err(Error::CorruptInput(format!(
                "page at position {} has index {}",
                position, page.index
            )));
        }
        if !source_format.is_paginated() && pages.len() != 1 {
            return Err(Error::CorruptInput(format!(
                "{} document must have exactly one page, found {}",
                source_format,
                pages.len()
            )));
        }

        metadata.page_count = pages.len();
        Ok(Self {
            id: DocumentId::new(),
            source_format,
            metadata,
            pages,
        })
    }

    /// The document identifier.
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The source family.
    pub fn source_format(&self) -> SourceFormat {
        self.source_format
    }

    /// Document metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Pages in render order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Get a page by index (0-based).
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Get a page by index, failing with `PageIndexOutOfRange`.
    pub fn try_page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or(Error::PageIndexOutOfRange {
            index,
            page_count: self.pages.len(),
        })
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of text runs across all pages.
    pub fn run_count(&self) -> usize {
        self.pages.iter().map(|p| p.text_runs.len()).sum()
    }

    /// Linear text: every run of every page concatenated without separators.
    ///
    /// This is exactly the text clause segmentation operates on.
    pub fn linear_text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|page| page.text_runs.iter())
            .map(|run| run.text.as_str())
            .collect()
    }

    /// Whether the document carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.pages
            .iter()
            .flat_map(|page| page.text_runs.iter())
            .all(|run| run.text.trim().is_empty())
    }

    /// Page containing the given character offset of the linear text.
    ///
    /// Offsets at or past the end map to the last page.
    pub fn page_for_offset(&self, char_offset: usize) -> usize {
        let mut consumed = 0;
        for page in &self.pages {
            consumed += page.char_count();
            if char_offset < consumed {
                return page.index;
            }
        }
        self.pages.len() - 1
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7"), paginated sources only
    pub pdf_version: Option<String>,

    /// Detected text encoding, plain-text sources only
    pub encoding: Option<String>,

    /// Total number of pages
    pub page_count: usize,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: Some(version.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRun;

    fn two_page_doc() -> Document {
        let first = Page::new(0, 612.0, 792.0).with_runs(vec![
            TextRun::unpositioned("ab"),
            TextRun::unpositioned("\n"),
        ]);
        let second = Page::new(1, 612.0, 792.0).with_runs(vec![TextRun::unpositioned("cd\n")]);
        Document::new(SourceFormat::Paginated, vec![first, second], Metadata::default()).unwrap()
    }

    #[test]
    fn test_document_rejects_empty_pages() {
        let result = Document::new(SourceFormat::Paginated, vec![], Metadata::default());
        assert!(matches!(result, Err(Error::CorruptInput(_))));
    }

    #[test]
    fn test_document_rejects_gapped_indices() {
        let pages = vec![Page::new(0, 1.0, 1.0), Page::new(2, 1.0, 1.0)];
        let result = Document::new(SourceFormat::Paginated, pages, Metadata::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_flowed_document_is_single_page() {
        let pages = vec![Page::flowed(0), Page::flowed(1)];
        assert!(Document::new(SourceFormat::Flowed, pages, Metadata::default()).is_err());
    }

    #[test]
    fn test_linear_text_and_offsets() {
        let doc = two_page_doc();
        assert_eq!(doc.linear_text(), "ab\ncd\n");
        assert_eq!(doc.metadata().page_count, 2);
        assert_eq!(doc.page_for_offset(0), 0);
        assert_eq!(doc.page_for_offset(2), 0);
        assert_eq!(doc.page_for_offset(3), 1);
        assert_eq!(doc.page_for_offset(100), 1);
    }

    #[test]
    fn test_try_page_out_of_range() {
        let doc = two_page_doc();
        assert!(doc.try_page(1).is_ok());
        assert!(matches!(
            doc.try_page(2),
            Err(Error::PageIndexOutOfRange {
                index: 2,
                page_count: 2
            })
        ));
    }

    #[test]
    fn test_documents_get_distinct_ids() {
        assert_ne!(two_page_doc().id(), two_page_doc().id());
    }
}
