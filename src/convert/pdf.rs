//! PDF to DOCX conversion.

use std::path::Path;

use crate::docx::DocxWriter;
use crate::error::Result;
use crate::model::Document;
use crate::parser::PdfParser;

use super::ConvertOptions;

/// Converts one PDF into a DOCX approximating its layout.
///
/// The PDF is parsed when the converter is created; writing can then be
/// repeated to files or memory.
#[derive(Debug, Clone)]
pub struct PdfToDocxConverter {
    document: Document,
    writer: DocxWriter,
}

impl PdfToDocxConverter {
    /// Parse a PDF file with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &ConvertOptions::default())
    }

    /// Parse a PDF file.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &ConvertOptions) -> Result<Self> {
        let parser = PdfParser::open_with_options(path, options.parse.clone())?;
        Ok(Self::from_document(parser.parse()?, options))
    }

    /// Parse a PDF held in memory with default options.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, &ConvertOptions::default())
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes_with_options(data: &[u8], options: &ConvertOptions) -> Result<Self> {
        let parser = PdfParser::from_bytes_with_options(data, options.parse.clone())?;
        Ok(Self::from_document(parser.parse()?, options))
    }

    /// Use an already parsed document.
    pub fn from_document(document: Document, options: &ConvertOptions) -> Self {
        Self {
            document,
            writer: DocxWriter::with_options(options.writer.clone()),
        }
    }

    /// The parsed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Write the DOCX to `output`, replacing any existing file.
    pub fn convert<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        let output = output.as_ref();
        self.writer.write_to_path(&self.document, output)?;
        log::info!(
            "converted {} page(s) to {}",
            self.document.page_count(),
            output.display()
        );
        Ok(())
    }

    /// Render the DOCX in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.writer.to_bytes(&self.document)
    }
}
