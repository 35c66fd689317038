//! DOCX reading, writing and restyling.
//!
//! [`DocxWriter`] turns the intermediate model into a new package.
//! [`WordDocument`] opens an existing package for editing, and
//! [`restyle_document`] / [`change_font`] force one font over it.

mod document;
mod package;
mod report;
mod restyle;
mod writer;
pub mod xml;

pub use document::{
    CellMut, FontMut, ParagraphMut, RowMut, RunMut, StyleMut, TableMut, WordDocument, RPR_ORDER,
    STYLE_ORDER,
};
pub use package::{
    DocxPackage, Part, CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, STYLES_PART,
};
pub use report::{FontReport, RunFont, RunFontEntry, RunLocation};
pub use restyle::{change_font, restyle_document, RestyleStats};
pub use writer::{half_points, twips, DocxWriter, WriterOptions};
pub use xml::W_NS;
