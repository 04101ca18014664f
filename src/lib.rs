//! # lexdoc
//!
//! Multi-format document rendering and clause-level diffing for Rust.
//!
//! PDF, DOCX and plain-text sources are extracted into one addressable
//! content model. Pages render to a raster with a selectable text overlay
//! that stays aligned at every zoom level, and two documents can be compared
//! clause by clause.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lexdoc::{extract_file, diff, Point, RenderEngine};
//!
//! fn main() -> lexdoc::Result<()> {
//!     // Extract a document
//!     let doc = extract_file("lease.pdf")?;
//!
//!     // Render the first page at 150%
//!     let page = RenderEngine::default().render(&doc, 0, 1.5, Point::default())?;
//!     println!("{} selectable spans", page.overlay_spans.len());
//!
//!     // Compare with a revision
//!     let revised = extract_file("lease-v2.docx")?;
//!     for edit in diff(&doc, &revised) {
//!         println!("{} {:?} ({})", edit.kind, edit.label(), edit.severity);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three source families**: paginated (PDF), flowed (DOCX), plain text
//! - **Raster + overlay rendering**: one transform drives pixels and text boxes
//! - **Selection**: device-space drags resolve to character ranges
//! - **Clause diff**: label matching plus LCS, with configurable severity
//! - **Cancellation**: superseded renders stop cooperatively
//! - **Parallel extraction**: Uses Rayon for multi-page documents

pub mod cancel;
pub mod config;
pub mod detect;
pub mod diff;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod select;
pub mod viewer;

// Re-export commonly used types
pub use cancel::{CancelToken, CancellationFlag, NeverCancel, Outcome};
pub use config::EngineConfig;
pub use detect::{detect_pdf_version, sniff_format, PdfHeader};
pub use diff::{
    diff, Clause, ClauseConfig, ClauseRef, DiffEngine, DiffSummary, Edit, EditKind, Severity,
    SeverityRule, SeverityTable,
};
pub use error::{Error, Result};
pub use model::{
    Document, DocumentId, Metadata, Page, Point, Rect, SourceFormat, TextPosition, TextRange,
    TextRun,
};
pub use parser::{extract, extract_as, extract_cancellable, ErrorMode, ExtractOptions};
pub use render::{
    to_json, JsonFormat, OverlaySpan, PageSelection, RenderEngine, RenderOptions, RenderStrategy,
    RenderedPage, ScaleBounds, ViewTransform,
};
pub use select::Selection;
pub use viewer::{Highlight, HighlightId, RenderRequest, ViewerController, ViewerOptions};

use std::path::Path;

/// Extract a document file, taking the format from its extension.
///
/// # Example
///
/// ```no_run
/// use lexdoc::extract_file;
///
/// let doc = extract_file("contract.docx").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    extract_file_with_options(path, &ExtractOptions::default())
}

/// Extract a document file with custom options.
///
/// # Example
///
/// ```no_run
/// use lexdoc::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().lenient().sequential();
/// let doc = extract_file_with_options("scan.pdf", &options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Document> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;
    let data = std::fs::read(path)?;
    extract_as(&data, format, options)
}

/// Extract a document from bytes and a declared format tag.
///
/// # Example
///
/// ```no_run
/// use lexdoc::extract_bytes;
///
/// let data = std::fs::read("notes.txt").unwrap();
/// let doc = extract_bytes(&data, "text/plain").unwrap();
/// ```
pub fn extract_bytes(data: &[u8], declared: &str) -> Result<Document> {
    extract(data, declared)
}

/// Extract the linear text of a document file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(extract_file(path)?.linear_text())
}

/// Read a file with tokio and extract it on the blocking pool.
///
/// `declared` overrides the extension-derived format tag.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> lexdoc::Result<()> {
/// let doc = lexdoc::extract_path_async("lease.pdf", None).await?;
/// # Ok(())
/// # }
/// ```
pub async fn extract_path_async<P: AsRef<Path>>(path: P, declared: Option<&str>) -> Result<Document> {
    let path = path.as_ref();
    let format = match declared {
        Some(tag) => SourceFormat::from_declared(tag)?,
        None => SourceFormat::from_path(path)?,
    };
    let data = tokio::fs::read(path).await?;

    tokio::task::spawn_blocking(move || extract_as(&data, format, &ExtractOptions::default()))
        .await
        .map_err(|e| Error::CorruptInput(format!("extraction task failed: {}", e)))?
}

/// Compare two document files clause by clause.
///
/// # Example
///
/// ```no_run
/// use lexdoc::compare_files;
///
/// let edits = compare_files("v1.pdf", "v2.pdf").unwrap();
/// println!("{} changes", edits.len());
/// ```
pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> Result<Vec<Edit>> {
    let doc_a = extract_file(a)?;
    let doc_b = extract_file(b)?;
    Ok(diff(&doc_a, &doc_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn text_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_extract_file_by_extension() {
        let file = text_file("제1조 목적\n", ".txt");
        let doc = extract_file(file.path()).unwrap();
        assert_eq!(doc.source_format(), SourceFormat::PlainText);
        assert_eq!(extract_text(file.path()).unwrap(), "제1조 목적\n");
    }

    #[test]
    fn test_unknown_extension() {
        let file = text_file("x", ".hwp");
        assert!(matches!(
            extract_file(file.path()),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_compare_files() {
        let a = text_file("Clause 1 Fee\n100\n", ".txt");
        let b = text_file("Clause 1 Fee\n200\n", ".txt");
        let edits = compare_files(a.path(), b.path()).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].severity, Severity::High);
    }

    #[tokio::test]
    async fn test_extract_path_async_with_override() {
        let file = text_file("hello\n", ".dat");
        let doc = extract_path_async(file.path(), Some("txt")).await.unwrap();
        assert_eq!(doc.linear_text(), "hello\n");
        assert!(extract_path_async(file.path(), None).await.is_err());
    }
}
