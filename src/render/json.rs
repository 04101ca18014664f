//! JSON export for documents, rendered overlays, and diffs.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any exported value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::RenderFailure(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Document, Metadata, Page, SourceFormat, TextRun};

    fn sample() -> Document {
        let metadata = Metadata {
            title: Some("Lease".to_string()),
            ..Default::default()
        };
        let page = Page::flowed(0).with_runs(vec![TextRun::unpositioned("제1조\n")]);
        Document::new(SourceFormat::PlainText, vec![page], metadata).unwrap()
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("Lease"));
        assert!(json.contains("\"plain_text\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(!json.contains("  "));
    }

    #[test]
    fn test_raster_source_not_serialized() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains("raster_source"));
    }
}
