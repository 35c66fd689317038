//! Intermediate document model.
//!
//! The parser fills this model from a PDF and the DOCX writer renders it.
//! It only carries what survives into the word-processing document: pages,
//! paragraphs with styled runs, and tables whose cells hold paragraphs.

mod document;
mod page;
mod paragraph;
mod table;

pub use document::{Document, Metadata};
pub use page::{Block, Page};
pub use paragraph::{Alignment, InlineContent, Paragraph, ParagraphStyle, TextRun, TextStyle};
pub use table::{Table, TableCell, TableRow};
