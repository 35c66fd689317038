//! # pdf2cursive
//!
//! Turn PDF worksheets into editable Word documents set in a handwriting
//! font.
//!
//! A PDF is parsed into a small document model, written out as a `.docx`
//! that keeps paragraphs and tables editable, and then every run of text is
//! forced into one font and size.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf2cursive::{process_upload, FontSpec};
//!
//! fn main() -> pdf2cursive::Result<()> {
//!     let pdf = std::fs::read("worksheet.pdf")?;
//!     let deliverable = process_upload(&pdf, &FontSpec::default())?;
//!
//!     std::fs::write(deliverable.file_name, &deliverable.data)?;
//!     println!("{}", deliverable.success_message());
//!     println!("{}", deliverable.install_note());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Six fonts**: the two Twinkl cursive faces plus four common system fonts
//! - **Size validation**: only whole point sizes from 8 to 72 are accepted
//! - **Table aware**: grid-aligned text becomes a real Word table
//! - **Parallel parsing**: pages are read with Rayon
//! - **Scoped scratch space**: intermediate files never outlive a conversion

pub mod convert;
pub mod detect;
pub mod docx;
pub mod error;
pub mod font;
pub mod model;
pub mod parser;

pub use convert::{
    convert_pdf_to_docx, process_upload, process_upload_with_options, ConvertOptions,
    Deliverable, PdfToDocxConverter, Workspace, DOCX_MIME_TYPE, DOWNLOAD_FILE_NAME,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use docx::{
    change_font, restyle_document, DocxWriter, FontReport, RestyleStats, RunFont, RunLocation,
    WordDocument, WriterOptions,
};
pub use error::{Error, Result};
pub use font::{FontChoice, FontSize, FontSpec};
pub use model::{
    Alignment, Block, Document, InlineContent, Metadata, Page, Paragraph, ParagraphStyle, Table,
    TableCell, TableRow, TextRun, TextStyle,
};
pub use parser::{ParseOptions, PdfParser};

use std::path::Path;

/// Parse a PDF file into the document model.
///
/// # Example
///
/// ```no_run
/// use pdf2cursive::parse_file;
///
/// let doc = parse_file("worksheet.pdf").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    PdfParser::open(path)?.parse()
}

/// Parse a PDF file with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    PdfParser::open_with_options(path, options)?.parse()
}

/// Parse a PDF held in memory.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    PdfParser::from_bytes(data)?.parse()
}

/// Report the font of the Normal style and of every run in a DOCX file.
///
/// # Example
///
/// ```no_run
/// use pdf2cursive::{inspect_fonts, FontSpec};
///
/// let report = inspect_fonts("cursive_worksheet.docx").unwrap();
/// assert!(report.is_uniform(&FontSpec::default()));
/// ```
pub fn inspect_fonts<P: AsRef<Path>>(path: P) -> Result<FontReport> {
    Ok(WordDocument::open(path)?.font_report())
}

/// Builder for converting and restyling in one go.
///
/// # Example
///
/// ```no_run
/// use pdf2cursive::{FontChoice, Pdf2Cursive};
///
/// let stats = Pdf2Cursive::new()
///     .with_font(FontChoice::ComicSansMs)
///     .with_size(16)?
///     .lenient()
///     .convert("worksheet.pdf", "worksheet.docx")?;
/// println!("{} runs restyled", stats.total());
/// # Ok::<(), pdf2cursive::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pdf2Cursive {
    options: ConvertOptions,
    spec: FontSpec,
}

impl Pdf2Cursive {
    /// Create a builder using the default font and size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip unreadable pages instead of failing.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Parse pages one after another.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Do not look for tables.
    pub fn without_tables(mut self) -> Self {
        self.options.parse = self.options.parse.with_tables(false);
        self
    }

    /// Set the font.
    pub fn with_font(mut self, font: FontChoice) -> Self {
        self.spec.font = font;
        self
    }

    /// Set the size in points, rejecting sizes outside `8..=72`.
    pub fn with_size(mut self, points: i64) -> Result<Self> {
        self.spec.size = FontSize::new(points)?;
        Ok(self)
    }

    /// Set font and size together.
    pub fn with_spec(mut self, spec: FontSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Replace the conversion options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// The font that will be applied.
    pub fn spec(&self) -> &FontSpec {
        &self.spec
    }

    /// Convert `pdf` to `docx` and restyle the result.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(&self, pdf: P, docx: Q) -> Result<RestyleStats> {
        let docx = docx.as_ref();
        PdfToDocxConverter::open_with_options(pdf, &self.options)?.convert(docx)?;
        change_font(docx, &self.spec)
    }

    /// Run the upload pipeline on PDF bytes.
    pub fn process_bytes(&self, pdf: &[u8]) -> Result<Deliverable> {
        process_upload_with_options(pdf, &self.spec, &self.options)
    }
}
