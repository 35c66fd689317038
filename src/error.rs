//! Error types for pdf2cursive.

use std::io;
use thiserror::Error;

/// Result type alias for pdf2cursive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting or restyling a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// The PDF structure is corrupted or malformed.
    #[error("Corrupted PDF structure: {0}")]
    Corrupted(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// The file is not a readable word-processing document.
    #[error("File format error: {0}")]
    FileFormat(String),

    /// Malformed XML inside a document part.
    #[error("XML error: {0}")]
    Xml(String),

    /// Error while producing the output document.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The requested font is not one of the supported choices.
    #[error("Unsupported font: {0}")]
    UnsupportedFont(String),

    /// The requested font size is outside the accepted range.
    #[error("Font size {0}pt is out of range (must be between 8 and 72)")]
    FontSizeOutOfRange(i64),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::FileFormat(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
