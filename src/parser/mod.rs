//! PDF parsing module.

pub mod backend;
mod layout;
mod options;
mod pdf_parser;
mod table_detector;

pub use backend::{LopdfBackend, PdfBackend};
pub use layout::{font_family, LayoutAnalyzer, TextLine, TextSpan};
pub use options::{ErrorMode, ParseOptions};
pub use pdf_parser::PdfParser;
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig};
