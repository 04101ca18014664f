//! Flowed extraction from DOCX (WordprocessingML) containers.
//!
//! Only the main document part is read. Each paragraph becomes one text run
//! ending in `"\n"`; manual line breaks split a paragraph into several runs.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, SourceFormat, TextRun};

const MAIN_PART: &str = "word/document.xml";
const CORE_PROPERTIES: &str = "docProps/core.xml";

/// Extract a DOCX container into a single-page flowed document.
pub fn extract_docx(data: &[u8]) -> Result<Document> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    let xml = read_part(&mut archive, MAIN_PART)?.ok_or_else(|| {
        Error::CorruptInput(format!("DOCX container is missing {}", MAIN_PART))
    })?;
    let runs = paragraphs_to_runs(&xml)?;

    let metadata = match read_part(&mut archive, CORE_PROPERTIES) {
        Ok(Some(core)) => core_metadata(&core).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable DOCX core properties: {}", e);
            Metadata::default()
        }),
        _ => Metadata::default(),
    };

    log::debug!("DOCX extracted: {} runs", runs.len());
    Document::new(
        SourceFormat::Flowed,
        vec![Page::flowed(0).with_runs(runs)],
        metadata,
    )
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| Error::CorruptInput(format!("{}: {}", name, e)))?;
    Ok(Some(xml))
}

/// Walk `w:body` and emit one run per paragraph segment.
fn paragraphs_to_runs(xml: &str) -> Result<Vec<TextRun>> {
    let mut reader = Reader::from_str(xml);
    let mut runs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" if in_paragraph => current.push('\t'),
                b"w:br" | b"w:cr" if in_paragraph => {
                    current.push('\n');
                    runs.push(TextRun::unpositioned(std::mem::take(&mut current)));
                }
                // An empty paragraph still occupies a line
                b"w:p" => runs.push(TextRun::unpositioned("\n")),
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape()?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    in_paragraph = false;
                    current.push('\n');
                    runs.push(TextRun::unpositioned(std::mem::take(&mut current)));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if in_paragraph {
        return Err(Error::CorruptInput(
            "DOCX document ended inside a paragraph".to_string(),
        ));
    }
    Ok(runs)
}

/// Read title, author, and dates from `docProps/core.xml`.
fn core_metadata(xml: &str) -> Result<Metadata> {
    let mut reader = Reader::from_str(xml);
    let mut metadata = Metadata::default();
    let mut field: Option<Vec<u8>> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => field = Some(e.name().as_ref().to_vec()),
            Event::Text(t) => {
                let value = t.unescape()?.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match field.as_deref() {
                    Some(b"dc:title") => metadata.title = Some(value),
                    Some(b"dc:creator") => metadata.author = Some(value),
                    Some(b"dcterms:created") => metadata.created = parse_w3c_date(&value),
                    Some(b"dcterms:modified") => metadata.modified = parse_w3c_date(&value),
                    _ => {}
                }
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(metadata)
}

fn parse_w3c_date(value: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}
