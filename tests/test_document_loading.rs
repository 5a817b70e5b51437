extern crate docrag;

use std::{fs, io, path::Path};

use docrag::*;

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_markdown_bypasses_converter() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "notes.md", "# Title\nbody\n");
    let converter = CommandConverter::new("definitely-not-a-real-converter", vec![]);

    let doc = load_document(&path, &converter).unwrap();
    assert_eq!(doc.text, "# Title\nbody\n");
    assert_eq!(doc.ext, "md");
}

#[test]
fn test_ids_are_stable_and_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.md", "# A\nsame\n");
    let b = write(dir.path(), "b.md", "# A\nsame\n");

    let first = load_document(&a, &PassthroughConverter).unwrap();
    let again = load_document(&a, &PassthroughConverter).unwrap();
    let other = load_document(&b, &PassthroughConverter).unwrap();
    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other.id);
}

#[test]
fn test_missing_file_is_not_found() {
    let err = load_document(Path::new("no/such/file.pdf"), &PassthroughConverter).unwrap_err();
    match err {
        RAGError::FileRead { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "picture.png", "not really a png");
    let converter = CommandConverter::from_command_line("pdftotext {input} -").unwrap();

    assert!(matches!(
        load_document(&path, &converter),
        Err(RAGError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_blank_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "blank.txt", "  \n\n");
    assert!(matches!(
        load_document(&path, &PassthroughConverter),
        Err(RAGError::EmptyDocument(_))
    ));
}

#[test]
fn test_unknown_program_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", "%PDF-1.4");
    let converter = CommandConverter::new("definitely-not-a-real-converter", vec![]);

    assert!(matches!(
        load_document(&path, &converter),
        Err(RAGError::ConverterNotFound { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_command_output_becomes_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", "# From converter\nline\n");
    let converter = CommandConverter::from_command_line("cat {input}").unwrap();

    let doc = load_document(&path, &converter).unwrap();
    assert_eq!(doc.text, "# From converter\nline\n");
    assert_eq!(doc.ext, "pdf");
}

#[cfg(unix)]
#[test]
fn test_failing_command_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.pdf", "%PDF-1.4");
    let converter = CommandConverter::from_command_line("false").unwrap();

    assert!(matches!(
        load_document(&path, &converter),
        Err(RAGError::ConversionFailed { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_invalid_utf8_output_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    fs::write(&path, [0x23u8, 0x20, 0xff, 0xfe, 0x0a]).unwrap();
    let converter = CommandConverter::from_command_line("cat").unwrap();

    assert!(matches!(
        load_document(&path, &converter),
        Err(RAGError::InvalidUtf8 { .. })
    ));
}

#[test]
fn test_default_converter_handles_pdf() {
    let converter = CommandConverter::from_command_line(config::DEFAULT_CONVERTER).unwrap();
    assert!(converter.supports("pdf"));
    assert!(config::DEFAULT_CONVERTER.contains("{input}"));
}

fn split_with_default_levels(doc: &Document) -> Vec<Segment> {
    MarkdownHeaderSplitter::new(SplitConfig::levels(Config::default().header_levels))
        .split_document(doc)
}

#[cfg(unix)]
#[test]
fn test_converted_markdown_splits_into_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "doc.pdf",
        "# EasyPoint\n## Overview\nA chatbot.\n## Setup\nInstall it.\n",
    );
    let converter = CommandConverter::from_command_line("cat {input}").unwrap();

    let doc = load_document(&path, &converter).unwrap();
    let segments = split_with_default_levels(&doc);
    assert!(segments.len() > 1);
    assert_eq!(segments[0].header("Header 1"), Some("EasyPoint"));
}

#[cfg(unix)]
#[test]
fn test_paged_plain_text_splits_by_page() {
    let dir = tempfile::tempdir().unwrap();
    // PDF extractors separate pages with form feeds and emit no markers
    let path = write(
        dir.path(),
        "doc.pdf",
        "Cover\n\x0cChapter one text\n\x0cChapter two text\n\x0c",
    );
    let converter = CommandConverter::from_command_line("cat {input}").unwrap();

    let doc = load_document(&path, &converter).unwrap();
    let segments = split_with_default_levels(&doc);
    let titles: Vec<Option<&str>> = segments.iter().map(|s| s.title()).collect();
    assert_eq!(titles, vec![Some("Page 1"), Some("Page 2"), Some("Page 3")]);
    assert!(segments[1].text.contains("Chapter one text"));
}

#[test]
fn test_passthrough_files_are_not_outlined() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "notes.txt", "one\x0ctwo\n");
    let doc = load_document(&path, &PassthroughConverter).unwrap();
    assert_eq!(doc.text, "one\x0ctwo\n");
}
