//! Content extraction for every supported source family.
//!
//! Each family has its own extractor; [`extract_as`] dispatches on
//! [`SourceFormat`] and [`extract`] resolves a declared format tag first.

mod backend;
mod docx;
mod layout;
mod options;
mod pdf_parser;
mod plain;

pub use backend::{BackendFontInfo, ContentOp, FontMetrics, LopdfBackend, PageId, PdfBackend, PdfValue};
pub use docx::extract_docx;
pub use layout::{build_runs, interpret_page, PageContent, TextSpan};
pub use options::{ErrorMode, ExtractOptions};
pub use pdf_parser::PdfExtractor;
pub use plain::extract_plain;

pub(crate) use layout::is_spaceless_script_char;

use crate::cancel::{CancelToken, NeverCancel, Outcome};
use crate::error::{Error, Result};
use crate::model::{Document, SourceFormat};

/// Extract a document from raw bytes and a declared format tag.
///
/// The tag is a file extension or MIME type. Unknown tags fail with
/// [`Error::UnsupportedFormat`]; structurally broken input fails with
/// [`Error::CorruptInput`].
pub fn extract(raw: &[u8], declared: &str) -> Result<Document> {
    let format = SourceFormat::from_declared(declared)?;
    extract_as(raw, format, &ExtractOptions::default())
}

/// Extract a document of a known format with custom options.
pub fn extract_as(raw: &[u8], format: SourceFormat, options: &ExtractOptions) -> Result<Document> {
    match extract_cancellable(raw, format, options, &NeverCancel)? {
        Outcome::Completed(doc) => Ok(doc),
        Outcome::Cancelled => Err(Error::CorruptInput(
            "extraction cancelled without a cancel request".to_string(),
        )),
    }
}

/// Extract a document from a declared tag with custom options.
pub fn extract_with_options(raw: &[u8], declared: &str, options: &ExtractOptions) -> Result<Document> {
    let format = SourceFormat::from_declared(declared)?;
    extract_as(raw, format, options)
}

/// Extract a document, checking `cancel` between pages.
pub fn extract_cancellable(
    raw: &[u8],
    format: SourceFormat,
    options: &ExtractOptions,
    cancel: &(dyn CancelToken + Sync),
) -> Result<Outcome<Document>> {
    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }
    log::debug!("Extracting {} document ({} bytes)", format, raw.len());

    let doc = match format {
        SourceFormat::Paginated => {
            let extractor = PdfExtractor::from_bytes_with_options(raw, options.clone())?;
            return extractor.extract(cancel);
        }
        SourceFormat::Flowed => extract_docx(raw)?,
        SourceFormat::PlainText => extract_plain(raw, options)?,
    };

    if cancel.is_cancelled() {
        return Ok(Outcome::Cancelled);
    }
    Ok(Outcome::Completed(doc))
}
