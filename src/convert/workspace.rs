//! Per-conversion scratch directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Name of the uploaded PDF inside a workspace.
pub const INPUT_FILE_NAME: &str = "input.pdf";
/// Name of the converted document inside a workspace.
pub const OUTPUT_FILE_NAME: &str = "converted_output.docx";

/// A temporary directory holding one conversion's input and output.
///
/// The directory and everything in it is removed when the workspace is
/// dropped, whichever way the conversion ended.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a workspace under the system temporary directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("pdf2cursive-").tempdir()?;
        log::debug!("created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Create a workspace under `parent`.
    pub fn new_in<P: AsRef<Path>>(parent: P) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("pdf2cursive-")
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    /// The workspace directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the uploaded PDF is stored.
    pub fn input_path(&self) -> PathBuf {
        self.dir.path().join(INPUT_FILE_NAME)
    }

    /// Where the converted document is written.
    pub fn output_path(&self) -> PathBuf {
        self.dir.path().join(OUTPUT_FILE_NAME)
    }

    /// Store the uploaded bytes as the input PDF.
    pub fn write_input(&self, data: &[u8]) -> Result<PathBuf> {
        let path = self.input_path();
        std::fs::write(&path, data)?;
        Ok(path)
    }

    /// Remove the directory now, reporting any failure.
    pub fn close(self) -> Result<()> {
        self.dir.close()?;
        Ok(())
    }
}
