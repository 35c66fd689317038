//! PDF document parser.

use std::path::Path;

use rayon::prelude::*;

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::Result;
use crate::model::{Block, Document, Metadata, Page};

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::layout::{group_lines_into_paragraphs, group_spans_into_lines, LayoutAnalyzer};
use super::options::{ErrorMode, ParseOptions};
use super::table_detector::TableDetector;

/// PDF document parser.
///
/// Reads every page of a PDF into the intermediate [`Document`] model:
/// paragraphs with styled runs, and tables recovered from aligned text.
pub struct PdfParser<B: PdfBackend = LopdfBackend> {
    backend: B,
    options: ParseOptions,
}

impl PdfParser<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        let format = detect_format_from_path(path)?;
        log::debug!("opening {} (PDF {})", path.display(), format.version);

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self::with_backend(backend, options))
    }

    /// Parse a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        detect_format_from_bytes(data)?;
        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self::with_backend(backend, options))
    }
}

impl<B: PdfBackend> PdfParser<B> {
    /// Build a parser over an already loaded backend.
    pub fn with_backend(backend: B, options: ParseOptions) -> Self {
        Self { backend, options }
    }

    /// The options this parser was created with.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.backend.pages().len() as u32
    }

    /// Parse the document and return a structured Document.
    pub fn parse(&self) -> Result<Document> {
        let mut document = Document::new();
        document.metadata = self.extract_metadata();

        let pages: Vec<(u32, PageId)> = self.backend.pages().into_iter().collect();
        document.metadata.page_count = pages.len() as u32;

        let results: Vec<Result<Page>> = if self.options.parallel && pages.len() > 1 {
            pages
                .par_iter()
                .map(|(number, id)| self.parse_page(*number, *id))
                .collect()
        } else {
            pages
                .iter()
                .map(|(number, id)| self.parse_page(*number, *id))
                .collect()
        };

        for ((number, id), result) in pages.iter().zip(results) {
            match result {
                Ok(page) => document.add_page(page),
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Failed to extract text from page {}: {}", number, e);
                    let (width, height) = self.backend.page_size(*id);
                    document.add_page(Page::new(*number, width, height));
                }
                Err(e) => return Err(e),
            }
        }

        log::debug!(
            "parsed {} page(s), {} table(s)",
            document.page_count(),
            document.table_count()
        );
        Ok(document)
    }

    /// Extract document metadata from the information dictionary.
    fn extract_metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.backend.version());

        metadata.title = self.backend.info_entry(b"Title");
        metadata.author = self.backend.info_entry(b"Author");
        metadata.subject = self.backend.info_entry(b"Subject");
        metadata.keywords = self.backend.info_entry(b"Keywords");
        metadata.creator = self.backend.info_entry(b"Creator");
        metadata.producer = self.backend.info_entry(b"Producer");
        metadata.created = self
            .backend
            .info_entry(b"CreationDate")
            .and_then(|d| parse_pdf_date(&d));
        metadata.modified = self
            .backend
            .info_entry(b"ModDate")
            .and_then(|d| parse_pdf_date(&d));
        metadata.encrypted = self.backend.is_encrypted();

        metadata
    }

    /// Parse a single page into blocks ordered top to bottom.
    fn parse_page(&self, number: u32, id: PageId) -> Result<Page> {
        let (width, height) = self.backend.page_size(id);
        let mut page = Page::new(number, width, height);

        let spans = LayoutAnalyzer::new(&self.backend).extract_page_spans(id)?;
        if spans.is_empty() {
            return Ok(page);
        }

        let mut blocks: Vec<(f32, Block)> = Vec::new();

        let spans = if self.options.detect_tables {
            let detector = TableDetector::new();
            let (tables, rest) = detector.detect(spans);
            for table in &tables {
                blocks.push((table.top_y, Block::Table(detector.to_table_model(table))));
            }
            rest
        } else {
            spans
        };

        let lines = group_spans_into_lines(spans);
        for positioned in group_lines_into_paragraphs(lines, width, self.options.preserve_line_breaks) {
            blocks.push((positioned.top_y, Block::Paragraph(positioned.paragraph)));
        }

        blocks.sort_by(|a, b| b.0.total_cmp(&a.0));
        page.elements = blocks.into_iter().map(|(_, block)| block).collect();

        Ok(page)
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
///
/// The timezone suffix is ignored; the time is taken as UTC.
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::parser::backend::{BackendFontInfo, ContentOp, PdfValue};
    use chrono::{Datelike, Timelike};
    use std::collections::BTreeMap;

    /// In-memory backend: each page is a list of (x, y, text) lines in Helvetica 12.
    struct ScriptedBackend {
        pages: Vec<Option<Vec<(i64, i64, &'static str)>>>,
    }

    impl PdfBackend for ScriptedBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            (1..=self.pages.len() as u32).map(|n| (n, (n, 0))).collect()
        }
        fn page_size(&self, _page: PageId) -> (f32, f32) {
            (612.0, 792.0)
        }
        fn page_fonts(&self, _page: PageId) -> Result<Vec<BackendFontInfo>> {
            Ok(vec![BackendFontInfo {
                name: b"F1".to_vec(),
                base_font: "Helvetica".to_string(),
            }])
        }
        fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
            match &self.pages[page.0 as usize - 1] {
                Some(_) => Ok(page.0.to_string().into_bytes()),
                None => Err(Error::Corrupted("Invalid content stream".to_string())),
            }
        }
        fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
            let index: usize = String::from_utf8_lossy(data).parse().unwrap_or(1);
            let mut ops = vec![ContentOp::new(
                "Tf",
                vec![PdfValue::Name(b"F1".to_vec()), PdfValue::Integer(12)],
            )];
            for (x, y, text) in self.pages[index - 1].iter().flatten() {
                ops.push(ContentOp::new("BT", vec![]));
                ops.push(ContentOp::new(
                    "Td",
                    vec![PdfValue::Integer(*x), PdfValue::Integer(*y)],
                ));
                ops.push(ContentOp::new("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())]));
                ops.push(ContentOp::new("ET", vec![]));
            }
            Ok(ops)
        }
        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            String::from_utf8_lossy(bytes).to_string()
        }
        fn info_entry(&self, key: &[u8]) -> Option<String> {
            match key {
                b"Title" => Some("Handwriting practice".to_string()),
                b"CreationDate" => Some("D:20240115103045+01'00'".to_string()),
                _ => None,
            }
        }
        fn version(&self) -> String {
            "1.5".to_string()
        }
        fn is_encrypted(&self) -> bool {
            false
        }
    }

    fn worksheet() -> ScriptedBackend {
        ScriptedBackend {
            pages: vec![
                Some(vec![
                    (72, 720, "Practice your letters"),
                    (72, 650, "Word"),
                    (250, 650, "Sound"),
                    (72, 630, "cat"),
                    (250, 630, "c-a-t"),
                    (72, 560, "Write the words neatly."),
                ]),
                Some(vec![(72, 720, "Page two")]),
            ],
        }
    }

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
        assert_eq!(date.hour(), 10);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 1);
        assert!(parse_pdf_date("D:20").is_none());
    }

    #[test]
    fn test_parse_blocks_in_reading_order() {
        let parser = PdfParser::with_backend(worksheet(), ParseOptions::default().sequential());
        let doc = parser.parse().unwrap();

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.metadata.page_count, 2);
        assert_eq!(doc.metadata.title.as_deref(), Some("Handwriting practice"));
        assert_eq!(doc.metadata.pdf_version, "1.5");
        assert!(doc.metadata.created.is_some());

        let page = &doc.pages[0];
        assert_eq!(page.elements.len(), 3);
        assert!(page.elements[0].is_paragraph());
        assert!(page.elements[1].is_table());
        assert!(page.elements[2].is_paragraph());

        let table = page.tables().next().unwrap();
        assert_eq!(table.plain_text(), "Word\tSound\ncat\tc-a-t");
        assert_eq!(doc.pages[1].plain_text(), "Page two");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = PdfParser::with_backend(worksheet(), ParseOptions::default().sequential())
            .parse()
            .unwrap();
        let parallel = PdfParser::with_backend(worksheet(), ParseOptions::default())
            .parse()
            .unwrap();
        assert_eq!(sequential.plain_text(), parallel.plain_text());
    }

    #[test]
    fn test_tables_disabled() {
        let parser = PdfParser::with_backend(worksheet(), ParseOptions::default().with_tables(false));
        let doc = parser.parse().unwrap();
        assert_eq!(doc.table_count(), 0);
    }

    #[test]
    fn test_strict_mode_fails_on_bad_page() {
        let backend = ScriptedBackend {
            pages: vec![Some(vec![(72, 720, "fine")]), None],
        };
        let parser = PdfParser::with_backend(backend, ParseOptions::default());
        assert!(matches!(parser.parse(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_lenient_mode_keeps_empty_page() {
        let backend = ScriptedBackend {
            pages: vec![Some(vec![(72, 720, "fine")]), None],
        };
        let parser = PdfParser::with_backend(backend, ParseOptions::default().lenient());
        let doc = parser.parse().unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(doc.pages[1].is_empty());
    }

    #[test]
    fn test_from_bytes_rejects_non_pdf() {
        assert!(matches!(
            PdfParser::from_bytes(b"PK\x03\x04 not a pdf"),
            Err(Error::UnknownFormat)
        ));
    }
}
