//! Plain-text extraction with encoding detection.

use std::borrow::Cow;

use encoding_rs::{Encoding, EUC_KR, UTF_8};

use super::options::ExtractOptions;
use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, SourceFormat, TextRun};

/// Decode plain text and split it into one run per line.
pub fn extract_plain(data: &[u8], options: &ExtractOptions) -> Result<Document> {
    let (text, encoding) = decode(data, options.legacy_encoding_fallback)?;
    let text = normalize_newlines(&text);

    if text.contains('\0') {
        return Err(Error::CorruptInput(
            "plain text contains NUL characters".to_string(),
        ));
    }

    let runs: Vec<TextRun> = text.split_inclusive('\n').map(TextRun::unpositioned).collect();
    log::debug!("Plain text extracted: {} lines ({})", runs.len(), encoding.name());

    let metadata = Metadata {
        encoding: Some(encoding.name().to_string()),
        ..Default::default()
    };
    Document::new(
        SourceFormat::PlainText,
        vec![Page::flowed(0).with_runs(runs)],
        metadata,
    )
}

/// BOM first, then strict UTF-8, then EUC-KR without replacement characters.
fn decode(data: &[u8], legacy_fallback: bool) -> Result<(Cow<'_, str>, &'static Encoding)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(data) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&data[bom_len..])
            .map(|text| (text, encoding))
            .ok_or_else(|| {
                Error::CorruptInput(format!("invalid {} text after BOM", encoding.name()))
            });
    }

    if let Ok(text) = std::str::from_utf8(data) {
        return Ok((Cow::Borrowed(text), UTF_8));
    }

    if legacy_fallback {
        if let Some(text) = EUC_KR.decode_without_bom_handling_and_without_replacement(data) {
            log::debug!("Plain text is not UTF-8; decoded as EUC-KR");
            return Ok((text, EUC_KR));
        }
    }

    Err(Error::CorruptInput(
        "plain text is not valid UTF-8 or a known legacy encoding".to_string(),
    ))
}

fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}
