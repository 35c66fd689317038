//! DOCX package (OPC zip container) access.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::detect::{detect_kind_from_bytes, FileKind};
use crate::error::{Error, Result};

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";
/// Style definitions part.
pub const STYLES_PART: &str = "word/styles.xml";
/// Content type declarations.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
/// Relationships of the main document part.
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// A single part of the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Zip entry name, e.g. `word/document.xml`
    pub name: String,
    pub data: Vec<u8>,
}

/// The parts of a DOCX file, kept in their original order.
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<Part>,
}

impl DocxPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Read a DOCX package from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if detect_kind_from_bytes(data) != FileKind::Zip {
            return Err(Error::FileFormat("not a DOCX (zip) package".to_string()));
        }

        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(damaged)?;
        let mut parts = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(damaged)?;
            if entry.is_dir() {
                continue;
            }
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut buf).map_err(damaged)?;
            parts.push(Part {
                name: entry.name().to_string(),
                data: buf,
            });
        }

        let package = Self { parts };
        if package.part(DOCUMENT_PART).is_none() {
            return Err(Error::FileFormat(format!("missing part {DOCUMENT_PART}")));
        }
        log::debug!("opened DOCX package with {} part(s)", package.parts.len());
        Ok(package)
    }

    /// Part data by name.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Replace a part's data, or append a new part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Part names in package order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Serialize the package as a zip archive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to a file, replacing it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

/// Anything wrong inside the archive means the input is not a readable DOCX.
fn damaged(e: impl std::fmt::Display) -> Error {
    Error::FileFormat(format!("damaged DOCX package: {e}"))
}
