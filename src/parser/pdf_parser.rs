//! Paginated extraction backed by lopdf.

use std::sync::Arc;

use rayon::prelude::*;

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::layout::{build_runs, interpret_page};
use super::options::{ErrorMode, ExtractOptions};
use crate::cancel::{CancelToken, Outcome};
use crate::detect::detect_pdf_version;
use crate::error::{Error, Result};
use crate::model::{
    DisplayList, DisplayListSource, Document, Metadata, Page, RasterSource, SourceFormat, TextRun,
};

/// PDF document extractor.
pub struct PdfExtractor {
    backend: Arc<LopdfBackend>,
    options: ExtractOptions,
}

impl PdfExtractor {
    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ExtractOptions::default())
    }

    /// Load a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Self> {
        detect_pdf_version(data)?;
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self {
            backend: Arc::new(backend),
            options,
        })
    }

    /// Get the number of pages.
    pub fn page_count(&self) -> usize {
        self.backend.pages().len()
    }

    /// Extract the document, checking `cancel` between pages.
    pub fn extract(&self, cancel: &(dyn CancelToken + Sync)) -> Result<Outcome<Document>> {
        let page_ids: Vec<PageId> = self.backend.pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(Error::CorruptInput("PDF has no pages".to_string()));
        }

        let extract_one = |(index, page_id): (usize, &PageId)| -> Result<Option<Page>> {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            self.extract_page(index, *page_id).map(Some)
        };

        let pages: Vec<Option<Page>> = if self.options.parallel && page_ids.len() > 1 {
            page_ids
                .par_iter()
                .enumerate()
                .map(extract_one)
                .collect::<Result<_>>()?
        } else {
            page_ids
                .iter()
                .enumerate()
                .map(extract_one)
                .collect::<Result<_>>()?
        };

        let Some(pages) = pages.into_iter().collect::<Option<Vec<Page>>>() else {
            log::debug!("PDF extraction cancelled");
            return Ok(Outcome::Cancelled);
        };

        let metadata = self.extract_metadata();
        Document::new(SourceFormat::Paginated, pages, metadata).map(Outcome::Completed)
    }

    /// Extract a single page: geometry, text runs, and a lazy raster handle.
    fn extract_page(&self, index: usize, page_id: PageId) -> Result<Page> {
        let bounds = self.backend.page_bounds(page_id);
        let runs = match self.extract_page_runs(page_id) {
            Ok(runs) => runs,
            Err(e) => {
                if self.options.error_mode == ErrorMode::Strict {
                    return Err(e);
                }
                log::warn!("Failed to extract text from page {}: {}", index + 1, e);
                Vec::new()
            }
        };

        let source = PdfPageSource {
            backend: self.backend.clone(),
            page_id,
        };
        Ok(Page::new(index, bounds.width, bounds.height)
            .with_runs(runs)
            .with_raster_source(RasterSource::new(Arc::new(source))))
    }

    fn extract_page_runs(&self, page_id: PageId) -> Result<Vec<TextRun>> {
        let content = interpret_page(self.backend.as_ref(), page_id)?;
        Ok(build_runs(content.spans))
    }

    /// Extract document metadata from the Info dictionary.
    fn extract_metadata(&self) -> Metadata {
        let doc = self.backend.raw_doc();
        let mut metadata = Metadata::with_version(self.backend.version());

        let info = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| info.as_reference().ok())
            .and_then(|info_ref| doc.get_dictionary(info_ref).ok());

        if let Some(info_dict) = info {
            metadata.title = get_string_from_dict(info_dict, b"Title");
            metadata.author = get_string_from_dict(info_dict, b"Author");
            metadata.creator = get_string_from_dict(info_dict, b"Creator");
            metadata.created =
                get_string_from_dict(info_dict, b"CreationDate").and_then(|d| parse_pdf_date(&d));
            metadata.modified =
                get_string_from_dict(info_dict, b"ModDate").and_then(|d| parse_pdf_date(&d));
        }

        metadata
    }
}

/// Resolves one page's display list on demand.
struct PdfPageSource {
    backend: Arc<LopdfBackend>,
    page_id: PageId,
}

impl DisplayListSource for PdfPageSource {
    fn display_list(&self) -> Result<DisplayList> {
        interpret_page(self.backend.as_ref(), self.page_id)
            .map(|content| content.display)
            .map_err(|e| Error::RenderFailure(format!("page {:?}: {}", self.page_id, e)))
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        lopdf::Object::String(bytes, _) => {
            // UTF-16BE with BOM is the PDF standard for Unicode
            if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
                let utf16: Vec<u16> = bytes[2..]
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&utf16).ok()
            } else {
                String::from_utf8(bytes.clone())
                    .ok()
                    .or_else(|| Some(bytes.iter().map(|&b| b as char).collect()))
            }
        }
        lopdf::Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);
        assert!(parse_pdf_date("D:20").is_none());
    }

    #[test]
    fn test_string_from_dict_utf16() {
        let mut dict = lopdf::Dictionary::new();
        dict.set(
            "Title",
            lopdf::Object::String(
                vec![0xFE, 0xFF, 0xB9, 0x74, 0xB3, 0x00],
                lopdf::StringFormat::Literal,
            ),
        );
        assert_eq!(get_string_from_dict(&dict, b"Title").as_deref(), Some("르대"));
    }

    #[test]
    fn test_rejects_missing_header() {
        assert!(matches!(
            PdfExtractor::from_bytes(b"hello"),
            Err(Error::CorruptInput(_))
        ));
    }
}
