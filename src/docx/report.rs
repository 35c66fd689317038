//! Font inspection of a DOCX document.

use serde::Serialize;

use crate::font::FontSpec;

use super::xml::Element;

/// Where a run sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunLocation {
    /// Directly inside a top-level paragraph
    Body,
    /// Inside a paragraph of a top-level table cell
    Table,
}

/// Font name and size set explicitly on a run or style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunFont {
    /// `w:rFonts@w:ascii`
    pub name: Option<String>,
    /// `w:sz@w:val`
    pub size_half_points: Option<u32>,
}

impl RunFont {
    /// Read font settings from an optional `w:rPr`.
    pub fn from_properties(properties: Option<&Element>) -> Self {
        let Some(properties) = properties else {
            return Self::default();
        };
        Self {
            name: properties
                .find_child("w:rFonts")
                .and_then(|f| f.attr("w:ascii"))
                .map(str::to_string),
            size_half_points: properties
                .find_child("w:sz")
                .and_then(|s| s.attr("w:val"))
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Size in points.
    pub fn size_points(&self) -> Option<f32> {
        self.size_half_points.map(|h| h as f32 / 2.0)
    }

    /// Whether name and size are exactly those of `spec`.
    pub fn matches(&self, spec: &FontSpec) -> bool {
        self.name.as_deref() == Some(spec.name())
            && self.size_half_points == Some(spec.size.half_points())
    }
}

/// One run in the report.
#[derive(Debug, Clone, Serialize)]
pub struct RunFontEntry {
    pub location: RunLocation,
    pub text: String,
    #[serde(flatten)]
    pub font: RunFont,
}

impl RunFontEntry {
    pub(crate) fn new(location: RunLocation, run: &Element) -> Self {
        Self {
            location,
            text: run.text(),
            font: RunFont::from_properties(run.find_child("w:rPr")),
        }
    }
}

/// Fonts of the Normal style and of every run the restyler reaches.
#[derive(Debug, Clone, Serialize)]
pub struct FontReport {
    /// Normal style font, `None` when the document has no Normal style
    pub normal: Option<RunFont>,
    pub runs: Vec<RunFontEntry>,
}

impl FontReport {
    /// True when the Normal style and every run carry `spec`.
    pub fn is_uniform(&self, spec: &FontSpec) -> bool {
        self.normal.as_ref().is_some_and(|n| n.matches(spec))
            && self.runs.iter().all(|r| r.font.matches(spec))
    }

    /// Number of runs in top-level paragraphs.
    pub fn body_run_count(&self) -> usize {
        self.count(RunLocation::Body)
    }

    /// Number of runs in table cells.
    pub fn table_run_count(&self) -> usize {
        self.count(RunLocation::Table)
    }

    /// Distinct font names across runs, in first-seen order.
    pub fn run_font_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.runs.iter().filter_map(|r| r.font.name.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn count(&self, location: RunLocation) -> usize {
        self.runs.iter().filter(|r| r.location == location).count()
    }
}
