//! End-to-end tests for the upload pipeline.

mod common;

use pdf2cursive::docx::{DocxPackage, DOCUMENT_PART, STYLES_PART};
use pdf2cursive::{
    process_upload, process_upload_with_options, restyle_document, ConvertOptions, Error,
    FontChoice, FontSize, FontSpec, Pdf2Cursive, WordDocument, DOCX_MIME_TYPE,
    DOWNLOAD_FILE_NAME,
};

fn spec(font: &str, size: &str) -> FontSpec {
    FontSpec::parse(font, size).unwrap()
}

fn isolated() -> (tempfile::TempDir, ConvertOptions) {
    let root = tempfile::tempdir().unwrap();
    let options = ConvertOptions::new().with_temp_root(root.path());
    (root, options)
}

fn leftover_entries(root: &tempfile::TempDir) -> usize {
    std::fs::read_dir(root.path()).unwrap().count()
}

#[test]
fn test_text_worksheet_in_arial() {
    let spec = spec("Arial", "12");
    let deliverable = process_upload(&common::text_pdf(), &spec).unwrap();

    assert_eq!(deliverable.file_name, DOWNLOAD_FILE_NAME);
    assert_eq!(deliverable.file_name, "cursive_worksheet.docx");
    assert_eq!(deliverable.mime_type, DOCX_MIME_TYPE);
    assert_eq!(deliverable.pages, 1);
    assert_eq!(
        deliverable.success_message(),
        "Converted successfully to Arial at 12pt!"
    );

    let doc = WordDocument::from_bytes(&deliverable.data).unwrap();
    let report = doc.font_report();
    assert!(report.is_uniform(&spec));
    assert!(report.body_run_count() > 0);

    let normal = report.normal.as_ref().unwrap();
    assert_eq!(normal.name.as_deref(), Some("Arial"));
    assert_eq!(normal.size_half_points, Some(24));

    let text: String = doc.paragraphs().map(|p| p.text()).collect::<Vec<_>>().join("\n");
    assert!(text.contains("Handwriting Practice"));
    assert!(text.contains("The quick brown fox jumps over the lazy dog."));
}

#[test]
fn test_table_worksheet() {
    let spec = spec("Twinkl Cursive Unlooped", "16");
    let deliverable = process_upload(&common::table_pdf(), &spec).unwrap();

    let package = DocxPackage::from_bytes(&deliverable.data).unwrap();
    let document_xml = String::from_utf8(package.part(DOCUMENT_PART).unwrap().to_vec()).unwrap();
    assert!(document_xml.contains("<w:tbl>"));

    let doc = WordDocument::from_bytes(&deliverable.data).unwrap();
    assert_eq!(doc.tables().count(), 1);

    let report = doc.font_report();
    assert_eq!(report.table_run_count(), 9);
    assert_eq!(deliverable.stats.table_runs, 9);
    assert!(report.is_uniform(&spec));
    assert!(report
        .runs
        .iter()
        .any(|r| r.text == "Fly a kite." && r.font.matches(&spec)));
}

#[test]
fn test_corrupted_upload_is_rejected() {
    let (root, options) = isolated();

    let garbage = process_upload_with_options(b"definitely not a pdf", &FontSpec::default(), &options);
    assert!(matches!(garbage, Err(Error::UnknownFormat)));

    let mut truncated = common::text_pdf();
    truncated.truncate(40);
    let truncated = process_upload_with_options(&truncated, &FontSpec::default(), &options);
    assert!(truncated.is_err());

    let error = truncated.unwrap_err();
    assert!(!format!("An error occurred: {}", error).is_empty());
    assert_eq!(leftover_entries(&root), 0);
}

#[test]
fn test_sequential_conversions_are_independent() {
    let first_spec = spec("Comic Sans MS", "20");
    let second_spec = spec("Times New Roman", "10");

    let first = process_upload(&common::text_pdf(), &first_spec).unwrap();
    let second = process_upload(&common::table_pdf(), &second_spec).unwrap();

    let first_report = WordDocument::from_bytes(&first.data).unwrap().font_report();
    let second_report = WordDocument::from_bytes(&second.data).unwrap().font_report();

    assert!(first_report.is_uniform(&first_spec));
    assert!(!first_report.is_uniform(&second_spec));
    assert!(second_report.is_uniform(&second_spec));
    assert_eq!(first_report.table_run_count(), 0);
    assert!(second_report.table_run_count() > 0);
}

#[test]
fn test_restyling_twice_changes_nothing() {
    let spec = spec("Twinkl Cursive Looped", "14");
    let deliverable = process_upload(&common::table_pdf(), &spec).unwrap();
    let once = DocxPackage::from_bytes(&deliverable.data).unwrap();

    let mut doc = WordDocument::from_bytes(&deliverable.data).unwrap();
    restyle_document(&mut doc, &spec);
    let twice = doc.to_package().unwrap();

    assert_eq!(once.part(DOCUMENT_PART), twice.part(DOCUMENT_PART));
    assert_eq!(once.part(STYLES_PART), twice.part(STYLES_PART));
}

#[test]
fn test_size_boundaries() {
    for points in [8, 72] {
        let spec = FontSpec::new(FontChoice::Calibri, FontSize::new(points).unwrap());
        let deliverable = process_upload(&common::text_pdf(), &spec).unwrap();
        let report = WordDocument::from_bytes(&deliverable.data).unwrap().font_report();
        assert!(report.is_uniform(&spec), "size {points}");
        assert_eq!(
            report.normal.unwrap().size_half_points,
            Some(points as u32 * 2)
        );
    }

    for points in [7, 73] {
        assert!(matches!(
            FontSize::new(points),
            Err(Error::FontSizeOutOfRange(p)) if p == points
        ));
        assert!(Pdf2Cursive::new().with_size(points).is_err());
    }
}

#[test]
fn test_workspace_removed_after_success() {
    let (root, options) = isolated();
    let deliverable =
        process_upload_with_options(&common::text_pdf(), &FontSpec::default(), &options).unwrap();
    assert!(!deliverable.is_empty());
    assert_eq!(leftover_entries(&root), 0);
}

#[test]
fn test_multi_page_document() {
    let deliverable = Pdf2Cursive::new()
        .sequential()
        .process_bytes(&common::multi_page_pdf(3))
        .unwrap();
    assert_eq!(deliverable.pages, 3);

    let package = DocxPackage::from_bytes(&deliverable.data).unwrap();
    let document_xml = String::from_utf8(package.part(DOCUMENT_PART).unwrap().to_vec()).unwrap();
    assert_eq!(document_xml.matches("w:type=\"page\"").count(), 2);

    let doc = WordDocument::from_bytes(&deliverable.data).unwrap();
    let text: Vec<String> = doc
        .paragraphs()
        .map(|p| p.text())
        .filter(|t| !t.is_empty())
        .collect();
    assert_eq!(
        text,
        vec!["Page 1 practice", "Page 2 practice", "Page 3 practice"]
    );
}

#[test]
fn test_builder_converts_between_paths() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("worksheet.pdf");
    let docx = dir.path().join("worksheet.docx");
    std::fs::write(&pdf, common::table_pdf()).unwrap();

    let stats = Pdf2Cursive::new()
        .with_font(FontChoice::TwinklCursiveUnlooped)
        .with_size(18)
        .unwrap()
        .convert(&pdf, &docx)
        .unwrap();
    assert_eq!(stats.table_runs, 9);

    let report = pdf2cursive::inspect_fonts(&docx).unwrap();
    assert!(report.is_uniform(&FontSpec::new(
        FontChoice::TwinklCursiveUnlooped,
        FontSize::new(18).unwrap()
    )));
}

#[test]
fn test_damaged_deliverable_is_not_restyled() {
    let deliverable = process_upload(&common::text_pdf(), &FontSpec::default()).unwrap();
    let mut bytes = deliverable.data;
    for byte in &mut bytes[60..120] {
        *byte ^= 0xFF;
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DOWNLOAD_FILE_NAME);
    std::fs::write(&path, &bytes).unwrap();

    let result = pdf2cursive::change_font(&path, &spec("Arial", "12"));
    assert!(matches!(result, Err(Error::FileFormat(_))), "{result:?}");
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}
