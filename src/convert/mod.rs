//! The conversion pipeline.
//!
//! An upload goes through four steps, each finishing before the next starts:
//! the PDF is converted to DOCX inside a fresh [`Workspace`], the DOCX is
//! restyled in place, its bytes are read back, and they are handed out as a
//! [`Deliverable`] with a fixed file name and MIME type.
//!
//! # Example
//!
//! ```no_run
//! use pdf2cursive::convert::process_upload;
//! use pdf2cursive::FontSpec;
//!
//! fn main() -> pdf2cursive::Result<()> {
//!     let pdf = std::fs::read("worksheet.pdf")?;
//!     let spec = FontSpec::parse("Twinkl Cursive Looped", "14")?;
//!     let deliverable = process_upload(&pdf, &spec)?;
//!     std::fs::write(deliverable.file_name, &deliverable.data)?;
//!     println!("{}", deliverable.success_message());
//!     Ok(())
//! }
//! ```

mod pdf;
mod workspace;

pub use pdf::PdfToDocxConverter;
pub use workspace::{Workspace, INPUT_FILE_NAME, OUTPUT_FILE_NAME};

use std::path::{Path, PathBuf};

use crate::docx::{change_font, RestyleStats, WriterOptions};
use crate::error::Result;
use crate::font::FontSpec;
use crate::parser::ParseOptions;

/// File name offered for every download.
pub const DOWNLOAD_FILE_NAME: &str = "cursive_worksheet.docx";

/// MIME type of the download.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Options for the conversion pipeline.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// How the PDF is read
    pub parse: ParseOptions,

    /// How the DOCX is written
    pub writer: WriterOptions,

    /// Directory in which workspaces are created (system temp dir if unset)
    pub temp_root: Option<PathBuf>,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parse options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set writer options.
    pub fn with_writer_options(mut self, options: WriterOptions) -> Self {
        self.writer = options;
        self
    }

    /// Skip unreadable pages instead of failing.
    pub fn lenient(mut self) -> Self {
        self.parse = self.parse.lenient();
        self
    }

    /// Parse pages one after another.
    pub fn sequential(mut self) -> Self {
        self.parse = self.parse.sequential();
        self
    }

    /// Create workspaces under `dir`.
    pub fn with_temp_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(dir.into());
        self
    }

    fn workspace(&self) -> Result<Workspace> {
        match &self.temp_root {
            Some(root) => Workspace::new_in(root),
            None => Workspace::new(),
        }
    }
}

/// A restyled document ready for download.
#[derive(Debug, Clone)]
pub struct Deliverable {
    /// DOCX bytes
    pub data: Vec<u8>,
    /// Always [`DOWNLOAD_FILE_NAME`]
    pub file_name: &'static str,
    /// Always [`DOCX_MIME_TYPE`]
    pub mime_type: &'static str,
    /// Font and size that were applied
    pub spec: FontSpec,
    /// Runs that were restyled
    pub stats: RestyleStats,
    /// Pages in the source PDF
    pub pages: u32,
}

impl Deliverable {
    /// Message shown after a successful conversion.
    pub fn success_message(&self) -> String {
        format!(
            "Converted successfully to {} at {}pt!",
            self.spec.font, self.spec.size
        )
    }

    /// Reminder that the font must be installed to display correctly.
    pub fn install_note(&self) -> String {
        format!(
            "Note: Ensure your computer has the font '{}' installed to view the file correctly.",
            self.spec.font
        )
    }

    /// Size of the document in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Convert the PDF at `pdf` into a DOCX at `docx`.
pub fn convert_pdf_to_docx<P: AsRef<Path>, Q: AsRef<Path>>(pdf: P, docx: Q) -> Result<()> {
    PdfToDocxConverter::open(pdf)?.convert(docx)
}

/// Run the whole pipeline on uploaded PDF bytes.
pub fn process_upload(pdf: &[u8], spec: &FontSpec) -> Result<Deliverable> {
    process_upload_with_options(pdf, spec, &ConvertOptions::default())
}

/// Run the whole pipeline on uploaded PDF bytes with custom options.
///
/// The workspace is removed before this returns, on success and on error.
pub fn process_upload_with_options(
    pdf: &[u8],
    spec: &FontSpec,
    options: &ConvertOptions,
) -> Result<Deliverable> {
    let workspace = options.workspace()?;
    let dir = workspace.path().to_path_buf();
    let result = convert_in(&workspace, pdf, spec, options);
    if let Err(e) = workspace.close() {
        log::warn!("could not remove workspace {}: {}", dir.display(), e);
    }
    result
}

fn convert_in(
    workspace: &Workspace,
    pdf: &[u8],
    spec: &FontSpec,
    options: &ConvertOptions,
) -> Result<Deliverable> {
    let input = workspace.write_input(pdf)?;
    let output = workspace.output_path();

    let converter = PdfToDocxConverter::open_with_options(&input, options)?;
    converter.convert(&output)?;

    let stats = change_font(&output, spec)?;
    let data = std::fs::read(&output)?;

    log::info!(
        "delivering {} ({} bytes, {} run(s) restyled to {})",
        DOWNLOAD_FILE_NAME,
        data.len(),
        stats.total(),
        spec
    );

    Ok(Deliverable {
        data,
        file_name: DOWNLOAD_FILE_NAME,
        mime_type: DOCX_MIME_TYPE,
        spec: *spec,
        stats,
        pages: converter.document().page_count(),
    })
}
