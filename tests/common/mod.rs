//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Arc;

use lexdoc::model::{DisplayList, DisplayListSource, RasterSource};
use lexdoc::{Document, Metadata, Page, Rect, SourceFormat, TextRun};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

/// A line of text placed with `Td x y` at `size` points, in PDF user space.
pub struct PdfLine<'a> {
    pub text: &'a str,
    pub x: i64,
    pub y: i64,
    pub size: i64,
}

/// Build a PDF with one Helvetica page per entry of `pages`.
pub fn pdf_bytes(pages: &[Vec<PdfLine<'_>>], title: Option<&str>) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for line in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), line.size.into()]));
            operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! { "Title" => Object::string_literal(title) });
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Build a DOCX whose body holds one paragraph per entry.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf.into_inner()
}

/// A plain-text document built straight from lines.
pub fn plain_doc(text: &str) -> Document {
    lexdoc::extract_bytes(text.as_bytes(), "txt").unwrap()
}

/// Display list source for a page with nothing painted.
pub struct BlankSource;

impl DisplayListSource for BlankSource {
    fn display_list(&self) -> lexdoc::Result<DisplayList> {
        Ok(DisplayList::new(612.0, 792.0))
    }
}

/// A blank Letter-sized paginated page with runs at fixed boxes.
pub fn positioned_page(index: usize, runs: &[(&str, Rect)]) -> Page {
    let runs = runs
        .iter()
        .map(|(text, bbox)| TextRun::new(*text, *bbox, bbox.bottom(), bbox.height))
        .collect();
    Page::new(index, 612.0, 792.0)
        .with_runs(runs)
        .with_raster_source(RasterSource::new(Arc::new(BlankSource)))
}

pub fn paginated(pages: Vec<Page>) -> Document {
    Document::new(SourceFormat::Paginated, pages, Metadata::default()).unwrap()
}

pub fn approx(a: Rect, b: Rect) -> bool {
    a.approx_eq(&b, 0.01)
}
