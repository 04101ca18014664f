//! Integration tests for extraction across the three source families.

mod common;

use common::{docx_bytes, pdf_bytes, PdfLine};
use lexdoc::{
    extract, extract_as, extract_cancellable, CancellationFlag, Error, ExtractOptions, Rect,
    SourceFormat,
};

fn two_line_pdf() -> Vec<u8> {
    pdf_bytes(
        &[vec![
            PdfLine { text: "Hello", x: 72, y: 700, size: 20 },
            PdfLine { text: "World", x: 72, y: 670, size: 20 },
        ]],
        Some("Lease"),
    )
}

#[test]
fn test_pdf_runs_carry_page_geometry() {
    let doc = extract(&two_line_pdf(), "application/pdf").unwrap();
    assert_eq!(doc.source_format(), SourceFormat::Paginated);
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.linear_text(), "Hello\nWorld\n");

    let page = &doc.pages()[0];
    assert_eq!(page.dimensions(), (612.0, 792.0));
    assert!(page.raster_source.is_some());

    // Baseline 792 - 700 = 92, ascent 0.8 em, 500/1000 em per glyph
    let hello = &page.text_runs[0];
    assert_eq!(hello.text, "Hello");
    assert!(hello.bbox.approx_eq(&Rect::new(72.0, 76.0, 50.0, 20.0), 0.01));
    assert_eq!(page.text_runs[1].text, "\n");
    assert!(page.text_runs[2].bbox.y > hello.bbox.y);
}

#[test]
fn test_pdf_metadata() {
    let doc = extract(&two_line_pdf(), "pdf").unwrap();
    let metadata = doc.metadata();
    assert_eq!(metadata.title.as_deref(), Some("Lease"));
    assert_eq!(metadata.pdf_version.as_deref(), Some("1.5"));
    assert_eq!(metadata.page_count, 1);
}

#[test]
fn test_pdf_pages_in_order_sequential_and_parallel() {
    let data = pdf_bytes(
        &[
            vec![PdfLine { text: "one", x: 72, y: 700, size: 12 }],
            vec![PdfLine { text: "two", x: 72, y: 700, size: 12 }],
            vec![PdfLine { text: "three", x: 72, y: 700, size: 12 }],
        ],
        None,
    );

    let parallel = extract_as(&data, SourceFormat::Paginated, &ExtractOptions::default()).unwrap();
    let sequential = extract_as(
        &data,
        SourceFormat::Paginated,
        &ExtractOptions::new().sequential(),
    )
    .unwrap();

    for doc in [&parallel, &sequential] {
        let texts: Vec<String> = doc.pages().iter().map(|p| p.linear_text()).collect();
        assert_eq!(texts, vec!["one\n", "two\n", "three\n"]);
        assert!(doc.pages().iter().enumerate().all(|(i, p)| p.index == i));
    }
}

#[test]
fn test_truncated_pdf_is_corrupt() {
    let data = two_line_pdf();
    let truncated = &data[..data.len() / 3];
    assert!(matches!(extract(truncated, "pdf"), Err(Error::CorruptInput(_))));
}

#[test]
fn test_docx_paragraphs() {
    let data = docx_bytes(&["제1조 목적", "이 계약은 임대차에 관한 것이다."]);
    let doc = extract(&data, "docx").unwrap();
    assert_eq!(doc.source_format(), SourceFormat::Flowed);
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.linear_text(), "제1조 목적\n이 계약은 임대차에 관한 것이다.\n");
    assert!(doc.pages()[0].raster_source.is_none());
}

#[test]
fn test_plain_text_runs_reconstruct_text() {
    let text = "Clause 1 Amount\r\nThe amount is 1000.\r\n\r\nClause 2 Term\n";
    let doc = extract(text.as_bytes(), "text/plain").unwrap();
    let joined: String = doc.pages()[0]
        .text_runs
        .iter()
        .map(|r| r.text.as_str())
        .collect();
    assert_eq!(joined, doc.linear_text());
    assert_eq!(joined, "Clause 1 Amount\nThe amount is 1000.\n\nClause 2 Term\n");
}

#[test]
fn test_declared_format_wins_over_content() {
    // A PDF declared as text is decoded as text, not sniffed
    let data = b"%PDF-1.4 not really\n";
    let doc = extract(data, "txt").unwrap();
    assert_eq!(doc.source_format(), SourceFormat::PlainText);
    assert!(matches!(extract(data, "image/png"), Err(Error::UnsupportedFormat(_))));
}

#[test]
fn test_cancelled_extraction_produces_nothing() {
    let flag = CancellationFlag::new();
    flag.cancel();
    let outcome = extract_cancellable(
        &two_line_pdf(),
        SourceFormat::Paginated,
        &ExtractOptions::default(),
        &flag,
    )
    .unwrap();
    assert!(outcome.is_cancelled());
}
