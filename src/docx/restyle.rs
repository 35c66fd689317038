//! Forcing one font over a whole document.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::font::FontSpec;

use super::document::WordDocument;

/// Runs touched by a restyle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestyleStats {
    /// Runs in top-level paragraphs
    pub body_runs: usize,
    /// Runs in table cells
    pub table_runs: usize,
}

impl RestyleStats {
    /// All runs touched.
    pub fn total(&self) -> usize {
        self.body_runs + self.table_runs
    }
}

/// Set the Normal style and every run of the body and of top-level tables
/// to `spec`.
///
/// Other run properties are left alone. Applying the same spec twice
/// produces the same document.
pub fn restyle_document(doc: &mut WordDocument, spec: &FontSpec) -> RestyleStats {
    let mut stats = RestyleStats::default();

    doc.normal_style_mut().font().apply(spec);

    for mut paragraph in doc.paragraphs_mut() {
        for mut run in paragraph.runs_mut() {
            run.font().apply(spec);
            stats.body_runs += 1;
        }
    }

    for mut table in doc.tables_mut() {
        for mut row in table.rows_mut() {
            for mut cell in row.cells_mut() {
                for mut paragraph in cell.paragraphs_mut() {
                    for mut run in paragraph.runs_mut() {
                        run.font().apply(spec);
                        stats.table_runs += 1;
                    }
                }
            }
        }
    }

    log::debug!(
        "restyled {} body run(s) and {} table run(s) to {}",
        stats.body_runs,
        stats.table_runs,
        spec
    );
    stats
}

/// Restyle the DOCX file at `path` in place.
///
/// The file is rewritten only after the whole document was restyled.
pub fn change_font<P: AsRef<Path>>(path: P, spec: &FontSpec) -> Result<RestyleStats> {
    let path = path.as_ref();
    let mut doc = WordDocument::open(path)?;
    let stats = restyle_document(&mut doc, spec);
    doc.save(path)?;
    log::info!("applied {} to {} run(s) in {}", spec, stats.total(), path.display());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{DocxPackage, DocxWriter, CONTENT_TYPES_PART, DOCUMENT_PART, STYLES_PART, W_NS};
    use crate::font::{FontChoice, FontSize};
    use crate::model::{Document, Page, Paragraph, Table, TableRow};

    fn sample() -> WordDocument {
        let mut doc = Document::new();
        let mut page = Page::letter(1);
        let mut p = Paragraph::with_text("Hello");
        p.add_line_break();
        p.add_text("there");
        page.add_paragraph(p);
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["a", "b"]));
        table.add_row(TableRow::from_strings(["c", "d"]));
        page.add_table(table);
        doc.add_page(page);

        let bytes = DocxWriter::new().to_bytes(&doc).unwrap();
        WordDocument::from_bytes(&bytes).unwrap()
    }

    fn spec(font: FontChoice, size: i64) -> FontSpec {
        FontSpec::new(font, FontSize::new(size).unwrap())
    }

    #[test]
    fn test_restyle_reaches_every_run() {
        let mut doc = sample();
        let spec = spec(FontChoice::ComicSansMs, 20);
        let stats = restyle_document(&mut doc, &spec);

        // "Hello", the line break run, "there"; four cells with one run each.
        assert_eq!(stats, RestyleStats { body_runs: 3, table_runs: 4 });
        assert!(doc.font_report().is_uniform(&spec));
    }

    #[test]
    fn test_restyle_is_idempotent() {
        let mut once = sample();
        let spec = spec(FontChoice::TwinklCursiveLooped, 12);
        restyle_document(&mut once, &spec);
        let first = once.to_package().unwrap();

        let mut twice = once.clone();
        restyle_document(&mut twice, &spec);
        let second = twice.to_package().unwrap();

        for part in ["word/document.xml", "word/styles.xml"] {
            assert_eq!(first.part(part), second.part(part), "{part} changed");
        }
    }

    #[test]
    fn test_restyle_overrides_previous_spec() {
        let mut doc = sample();
        restyle_document(&mut doc, &spec(FontChoice::Arial, 8));
        let last = spec(FontChoice::Calibri, 72);
        restyle_document(&mut doc, &last);

        let report = doc.font_report();
        assert!(report.is_uniform(&last));
        assert_eq!(report.run_font_names(), vec!["Calibri"]);
    }

    #[test]
    fn test_change_font_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");
        sample().save(&path).unwrap();

        let spec = spec(FontChoice::TimesNewRoman, 16);
        let stats = change_font(&path, &spec).unwrap();
        assert_eq!(stats.total(), 7);

        let reopened = WordDocument::open(&path).unwrap();
        assert!(reopened.font_report().is_uniform(&spec));
    }

    #[test]
    fn test_change_font_rejects_non_docx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, b"plain text").unwrap();

        let result = change_font(&path, &FontSpec::default());
        assert!(matches!(result, Err(crate::Error::FileFormat(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"plain text");
    }

    fn save_package(package: &DocxPackage) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");
        package.save(&path).unwrap();
        (dir, path)
    }

    fn foreign_package(document: String, styles: String) -> DocxPackage {
        let original = sample().to_package().unwrap();
        let mut package = DocxPackage::new();
        package.set_part(CONTENT_TYPES_PART, original.part(CONTENT_TYPES_PART).unwrap().to_vec());
        package.set_part(DOCUMENT_PART, document.into_bytes());
        package.set_part(STYLES_PART, styles.into_bytes());
        package
    }

    #[test]
    fn test_change_font_keeps_foreign_prefix() {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><ns0:document xmlns:ns0="{W_NS}"><ns0:body><ns0:p><ns0:r><ns0:t>Trace me</ns0:t></ns0:r></ns0:p><ns0:tbl><ns0:tr><ns0:tc><ns0:p><ns0:r><ns0:rPr><ns0:b/></ns0:rPr><ns0:t>cell</ns0:t></ns0:r></ns0:p></ns0:tc></ns0:tr></ns0:tbl></ns0:body></ns0:document>"#
        );
        let styles = format!(
            r#"<ns0:styles xmlns:ns0="{W_NS}"><ns0:style ns0:type="paragraph" ns0:default="1" ns0:styleId="Normal"><ns0:name ns0:val="Normal"/></ns0:style></ns0:styles>"#
        );
        let (_dir, path) = save_package(&foreign_package(document, styles));

        let spec = spec(FontChoice::TwinklCursiveUnlooped, 18);
        let stats = change_font(&path, &spec).unwrap();
        assert_eq!(stats, RestyleStats { body_runs: 1, table_runs: 1 });

        let reopened = WordDocument::open(&path).unwrap();
        assert!(reopened.font_report().is_uniform(&spec));

        let saved = DocxPackage::open(&path).unwrap();
        let xml = String::from_utf8(saved.part(DOCUMENT_PART).unwrap().to_vec()).unwrap();
        assert!(xml.contains("<ns0:body>"));
        assert!(xml.contains(r#"<ns0:rFonts ns0:ascii="Twinkl Cursive Unlooped""#));
        assert!(xml.contains("<ns0:b/>"));
        assert!(!xml.contains("<w:"));
    }

    #[test]
    fn test_change_font_with_default_namespace() {
        let document = format!(
            r#"<document xmlns="{W_NS}"><body><p><r><t>Trace me</t></r></p></body></document>"#
        );
        let styles = format!(r#"<styles xmlns="{W_NS}"/>"#);
        let (_dir, path) = save_package(&foreign_package(document, styles));

        let spec = spec(FontChoice::Arial, 12);
        let stats = change_font(&path, &spec).unwrap();
        assert_eq!(stats.body_runs, 1);

        let reopened = WordDocument::open(&path).unwrap();
        let report = reopened.font_report();
        assert!(report.is_uniform(&spec));
        assert!(report.normal.is_some());

        let saved = DocxPackage::open(&path).unwrap();
        let xml = String::from_utf8(saved.part(DOCUMENT_PART).unwrap().to_vec()).unwrap();
        assert!(xml.contains("<body>"));
        assert!(xml.contains(&format!(r#"xmlns:w="{W_NS}""#)));
        assert!(xml.contains(r#"<rFonts w:ascii="Arial" w:hAnsi="Arial"/>"#));
    }

    #[test]
    fn test_change_font_without_styles_part() {
        let original = sample().to_package().unwrap();
        let mut package = DocxPackage::new();
        for name in original.part_names().filter(|name| *name != STYLES_PART) {
            package.set_part(name, original.part(name).unwrap().to_vec());
        }
        let (_dir, path) = save_package(&package);

        let spec = spec(FontChoice::ComicSansMs, 14);
        let stats = change_font(&path, &spec).unwrap();
        assert_eq!(stats.total(), 7);

        let report = WordDocument::open(&path).unwrap().font_report();
        assert!(report.is_uniform(&spec));
        assert_eq!(report.normal.unwrap().name.as_deref(), Some("Comic Sans MS"));
    }

    #[test]
    fn test_change_font_rejects_damaged_package() {
        let mut bytes = sample().to_bytes().unwrap();
        for byte in &mut bytes[60..120] {
            *byte ^= 0xFF;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("damaged.docx");
        std::fs::write(&path, &bytes).unwrap();

        let result = change_font(&path, &FontSpec::default());
        assert!(matches!(result, Err(crate::Error::FileFormat(_))), "{result:?}");
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
