//! Format detection from declared tags, file extensions, and magic bytes.

use crate::error::{Error, Result};
use crate::model::SourceFormat;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// ZIP local file header, the container of DOCX.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE2 compound file header, used by legacy .doc and .hwp.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

impl SourceFormat {
    /// Map a declared format tag (extension or MIME type) to a source format.
    ///
    /// Matching is case-insensitive and ignores a leading dot. Anything
    /// outside the three supported families is `UnsupportedFormat`.
    pub fn from_declared(tag: &str) -> Result<Self> {
        let normalized = tag.trim().trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "pdf" | "application/pdf" => Ok(SourceFormat::Paginated),
            "docx" | DOCX_MIME => Ok(SourceFormat::Flowed),
            "txt" | "text" | "text/plain" => Ok(SourceFormat::PlainText),
            _ => Err(Error::UnsupportedFormat(tag.trim().to_string())),
        }
    }

    /// Derive the declared format from a path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        Self::from_declared(ext)
    }
}

/// Guess the source format from leading bytes.
///
/// Returns `None` for binary formats outside the supported families.
pub fn sniff_format(data: &[u8]) -> Option<SourceFormat> {
    if data.starts_with(PDF_MAGIC) {
        Some(SourceFormat::Paginated)
    } else if data.starts_with(ZIP_MAGIC) {
        Some(SourceFormat::Flowed)
    } else if data.starts_with(OLE_MAGIC) {
        None
    } else if looks_like_text(data) {
        Some(SourceFormat::PlainText)
    } else {
        None
    }
}

/// Whether the bytes start with a legacy OLE2 compound file header.
pub fn is_legacy_compound(data: &[u8]) -> bool {
    data.starts_with(OLE_MAGIC)
}

fn looks_like_text(data: &[u8]) -> bool {
    let sample = &data[..data.len().min(512)];
    if sample.starts_with(&[0xFF, 0xFE]) || sample.starts_with(&[0xFE, 0xFF]) {
        return true;
    }
    !sample.contains(&0)
}

/// Read the PDF header from a file.
pub fn detect_pdf_from_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 16];
    let read = reader.read(&mut header)?;
    detect_pdf_version(&header[..read])
}

/// Parse the `%PDF-x.y` header.
///
/// # Returns
/// * `Ok(PdfHeader)` if the data starts with a valid PDF header
/// * `Err(Error::CorruptInput)` otherwise
pub fn detect_pdf_version(data: &[u8]) -> Result<PdfHeader> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::CorruptInput("missing %PDF- header".to_string()));
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::CorruptInput(format!(
            "malformed PDF version '{}'",
            version
        )));
    }

    Ok(PdfHeader { version })
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    let chars: Vec<char> = version.chars().collect();
    chars.len() == 3 && chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if bytes represent a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_pdf_version(data).is_ok()
}
