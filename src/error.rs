//! Error types for lexdoc library.

use std::io;
use thiserror::Error;

/// Result type alias for lexdoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting, rendering, or configuring.
///
/// Cancellation is never reported through this type; cancelled work resolves
/// to [`Outcome::Cancelled`](crate::cancel::Outcome::Cancelled).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The declared format is not one of the supported families.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The bytes could not be parsed as the declared format.
    #[error("Corrupt input: {0}")]
    CorruptInput(String),

    /// Page index is out of range.
    #[error("Page index {index} is out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    /// Rasterization or layout of a page failed.
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// A configuration value (pattern, bound, JSON document) was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Whether the error should be shown as an unsupported-format notice.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedFormat(_) | Error::CorruptInput(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::CorruptInput(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) if e.kind() != io::ErrorKind::UnexpectedEof => {
                Error::Io(e)
            }
            _ => Error::CorruptInput(format!("DOCX container: {}", err)),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptInput(format!("DOCX markup: {}", err))
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageIndexOutOfRange {
            index: 10,
            page_count: 5,
        };
        assert_eq!(
            err.to_string(),
            "Page index 10 is out of range (document has 5 pages)"
        );

        let err = Error::UnsupportedFormat("hwp".to_string());
        assert_eq!(err.to_string(), "Unsupported format: hwp");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_regex_error_is_config_error() {
        let err: Error = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_is_unsupported() {
        assert!(Error::UnsupportedFormat("doc".into()).is_unsupported());
        assert!(Error::CorruptInput("truncated".into()).is_unsupported());
        assert!(!Error::RenderFailure("oom".into()).is_unsupported());
    }
}
