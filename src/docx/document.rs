//! Editable view of an existing DOCX file.
//!
//! Only the main document and style parts are parsed; every other part of
//! the package is carried through untouched. A package without a style part
//! gets an empty one, registered in the document relationships and content
//! types when written back. The view types mirror the
//! word-processing object model: body paragraphs and tables, rows, cells,
//! runs, and the font of a run or style.

use std::path::Path;

use crate::error::{Error, Result};
use crate::font::FontSpec;

use super::package::{
    DocxPackage, CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, STYLES_PART,
};
use super::report::{FontReport, RunFont, RunFontEntry, RunLocation};
use super::writer::{OFFICE_REL, PKG_REL_NS, STYLES_CONTENT_TYPE};
use super::xml::{Element, Node, XmlDocument, W_NS};

/// Child order of `w:rPr` (CT_RPr).
pub const RPR_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps",
    "w:strike", "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof",
    "w:snapToGrid", "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern",
    "w:position", "w:sz", "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd",
    "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout",
    "w:specVanish", "w:oMath",
];

/// Child order of `w:style` (CT_Style).
pub const STYLE_ORDER: &[&str] = &[
    "w:name", "w:aliases", "w:basedOn", "w:next", "w:link", "w:autoRedefine", "w:hidden",
    "w:uiPriority", "w:semiHidden", "w:unhideWhenUsed", "w:qFormat", "w:locked",
    "w:personal", "w:personalCompose", "w:personalReply", "w:rsid", "w:pPr", "w:rPr",
    "w:tblPr", "w:trPr", "w:tcPr", "w:tblStylePr",
];

const NORMAL: &str = "Normal";

/// A DOCX file opened for editing.
#[derive(Debug, Clone)]
pub struct WordDocument {
    package: DocxPackage,
    document: XmlDocument,
    styles: XmlDocument,
}

impl WordDocument {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_package(DocxPackage::open(path)?)
    }

    /// Read a DOCX file from memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_package(DocxPackage::from_bytes(data)?)
    }

    /// Parse the document and style parts of a package.
    pub fn from_package(package: DocxPackage) -> Result<Self> {
        let document = parse_part(&package, DOCUMENT_PART)?;
        let styles = match package.part(STYLES_PART) {
            Some(_) => parse_part(&package, STYLES_PART)?,
            None => {
                log::debug!("package has no {STYLES_PART}; starting an empty one");
                XmlDocument::new(Element::new("w:styles").with_attr("xmlns:w", W_NS))
            }
        };

        if document.root.find_child("w:body").is_none() {
            return Err(Error::FileFormat("document has no body".to_string()));
        }

        Ok(Self {
            package,
            document,
            styles,
        })
    }

    /// Top-level paragraphs of the body.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Element> {
        self.body().into_iter().flat_map(|b| b.child_elements("w:p"))
    }

    /// Top-level paragraphs of the body, for editing.
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = ParagraphMut<'_>> {
        self.body_mut()
            .into_iter()
            .flat_map(|b| b.child_elements_mut("w:p"))
            .map(ParagraphMut::new)
    }

    /// Top-level tables of the body.
    pub fn tables(&self) -> impl Iterator<Item = &Element> {
        self.body().into_iter().flat_map(|b| b.child_elements("w:tbl"))
    }

    /// Top-level tables of the body, for editing.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = TableMut<'_>> {
        self.body_mut()
            .into_iter()
            .flat_map(|b| b.child_elements_mut("w:tbl"))
            .map(|element| TableMut { element })
    }

    /// The Normal paragraph style, if the document defines one.
    pub fn normal_style(&self) -> Option<&Element> {
        self.styles.root.child_elements("w:style").find(|s| is_normal_style(s))
    }

    /// The Normal paragraph style, created when missing.
    pub fn normal_style_mut(&mut self) -> StyleMut<'_> {
        let root = &mut self.styles.root;
        let index = root.children.iter().position(|n| match n {
            Node::Element(e) => e.name == "w:style" && is_normal_style(e),
            _ => false,
        });

        let element = match index {
            Some(index) => match &mut root.children[index] {
                Node::Element(e) => e,
                _ => unreachable!("position matched an element"),
            },
            None => {
                log::debug!("styles part has no Normal style; adding one");
                root.push(
                    Element::new("w:style")
                        .with_attr("w:type", "paragraph")
                        .with_attr("w:default", "1")
                        .with_attr("w:styleId", NORMAL)
                        .with_child(Element::new("w:name").with_attr("w:val", NORMAL))
                        .with_child(Element::new("w:qFormat")),
                );
                match root.children.last_mut() {
                    Some(Node::Element(e)) => e,
                    _ => unreachable!("style was just appended"),
                }
            }
        };
        StyleMut { element }
    }

    /// Font name and size of the Normal style and of every reachable run.
    pub fn font_report(&self) -> FontReport {
        let normal = self
            .normal_style()
            .map(|s| RunFont::from_properties(s.find_child("w:rPr")));

        let mut runs = Vec::new();
        for paragraph in self.paragraphs() {
            for run in paragraph.child_elements("w:r") {
                runs.push(RunFontEntry::new(RunLocation::Body, run));
            }
        }
        for table in self.tables() {
            for run in table_runs(table) {
                runs.push(RunFontEntry::new(RunLocation::Table, run));
            }
        }

        FontReport { normal, runs }
    }

    /// Serialize to DOCX bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_package()?.to_bytes()
    }

    /// Write to a file, replacing it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.to_package()?.save(path)
    }

    /// The package with the edited parts written back.
    pub fn to_package(&self) -> Result<DocxPackage> {
        let mut package = self.package.clone();
        if package.part(STYLES_PART).is_none() {
            register_styles_part(&mut package)?;
        }
        package.set_part(DOCUMENT_PART, self.document.to_bytes()?);
        package.set_part(STYLES_PART, self.styles.to_bytes()?);
        Ok(package)
    }

    fn body(&self) -> Option<&Element> {
        self.document.root.find_child("w:body")
    }

    fn body_mut(&mut self) -> Option<&mut Element> {
        self.document.root.find_child_mut("w:body")
    }
}

fn parse_part(package: &DocxPackage, name: &str) -> Result<XmlDocument> {
    let data = package
        .part(name)
        .ok_or_else(|| Error::FileFormat(format!("missing part {name}")))?;
    XmlDocument::parse(data).map_err(|e| Error::FileFormat(format!("{name}: {e}")))
}

/// Add the style part's relationship and content type override when the
/// package lacks them.
fn register_styles_part(package: &mut DocxPackage) -> Result<()> {
    let rel_type = format!("{OFFICE_REL}/styles");

    let mut rels = match package.part(DOCUMENT_RELS_PART) {
        Some(_) => parse_part(package, DOCUMENT_RELS_PART)?,
        None => XmlDocument::new(Element::new("Relationships").with_attr("xmlns", PKG_REL_NS)),
    };
    let linked = rels
        .root
        .child_elements("Relationship")
        .any(|r| r.attr("Type") == Some(rel_type.as_str()));
    if !linked {
        let id = free_relationship_id(&rels.root);
        log::debug!("linking {STYLES_PART} as {id}");
        rels.root.push(
            Element::new("Relationship")
                .with_attr("Id", id)
                .with_attr("Type", rel_type)
                .with_attr("Target", "styles.xml"),
        );
        package.set_part(DOCUMENT_RELS_PART, rels.to_bytes()?);
    }

    let mut types = parse_part(package, CONTENT_TYPES_PART)?;
    let declared = types
        .root
        .child_elements("Override")
        .any(|o| o.attr("PartName") == Some("/word/styles.xml"));
    if !declared {
        types.root.push(
            Element::new("Override")
                .with_attr("PartName", "/word/styles.xml")
                .with_attr("ContentType", STYLES_CONTENT_TYPE),
        );
        package.set_part(CONTENT_TYPES_PART, types.to_bytes()?);
    }
    Ok(())
}

fn free_relationship_id(rels: &Element) -> String {
    let taken: Vec<&str> = rels
        .child_elements("Relationship")
        .filter_map(|r| r.attr("Id"))
        .collect();
    (1..)
        .map(|n| format!("rId{n}"))
        .find(|id| !taken.contains(&id.as_str()))
        .unwrap_or_else(|| "rIdStyles".to_string())
}

fn is_normal_style(style: &Element) -> bool {
    if style.attr("w:type") != Some("paragraph") {
        return false;
    }
    style.attr("w:styleId") == Some(NORMAL)
        || style
            .find_child("w:name")
            .and_then(|n| n.attr("w:val"))
            .is_some_and(|v| v.eq_ignore_ascii_case(NORMAL))
}

/// Runs of every paragraph of every cell of every row of a table.
fn table_runs(table: &Element) -> impl Iterator<Item = &Element> {
    table
        .child_elements("w:tr")
        .flat_map(|tr| tr.child_elements("w:tc"))
        .flat_map(|tc| tc.child_elements("w:p"))
        .flat_map(|p| p.child_elements("w:r"))
}

/// A paragraph (`w:p`).
pub struct ParagraphMut<'a> {
    element: &'a mut Element,
}

impl<'a> ParagraphMut<'a> {
    fn new(element: &'a mut Element) -> Self {
        Self { element }
    }

    /// Runs directly inside the paragraph.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = RunMut<'_>> {
        self.element
            .child_elements_mut("w:r")
            .map(|element| RunMut { element })
    }

    /// Paragraph text.
    pub fn text(&self) -> String {
        self.element.text()
    }
}

/// A run (`w:r`).
pub struct RunMut<'a> {
    element: &'a mut Element,
}

impl RunMut<'_> {
    /// Run formatting; `w:rPr` is created as the run's first child if missing.
    pub fn font(&mut self) -> FontMut<'_> {
        FontMut {
            properties: self.element.get_or_insert_first_child("w:rPr"),
        }
    }

    /// Run text.
    pub fn text(&self) -> String {
        self.element.text()
    }
}

/// A table (`w:tbl`).
pub struct TableMut<'a> {
    element: &'a mut Element,
}

impl TableMut<'_> {
    /// Rows of the table.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = RowMut<'_>> {
        self.element
            .child_elements_mut("w:tr")
            .map(|element| RowMut { element })
    }
}

/// A table row (`w:tr`).
pub struct RowMut<'a> {
    element: &'a mut Element,
}

impl RowMut<'_> {
    /// Cells of the row.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = CellMut<'_>> {
        self.element
            .child_elements_mut("w:tc")
            .map(|element| CellMut { element })
    }
}

/// A table cell (`w:tc`).
pub struct CellMut<'a> {
    element: &'a mut Element,
}

impl CellMut<'_> {
    /// Paragraphs of the cell.
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = ParagraphMut<'_>> {
        self.element.child_elements_mut("w:p").map(ParagraphMut::new)
    }
}

/// A style definition (`w:style`).
pub struct StyleMut<'a> {
    element: &'a mut Element,
}

impl StyleMut<'_> {
    /// Character formatting of the style.
    pub fn font(&mut self) -> FontMut<'_> {
        FontMut {
            properties: self.element.get_or_insert_child("w:rPr", STYLE_ORDER),
        }
    }

    /// Style identifier.
    pub fn id(&self) -> Option<&str> {
        self.element.attr("w:styleId")
    }
}

/// Font settings inside a `w:rPr`.
pub struct FontMut<'a> {
    properties: &'a mut Element,
}

impl FontMut<'_> {
    /// Set the font used for Latin text.
    ///
    /// Theme font references on the same element would take precedence in
    /// Word, so they are removed.
    pub fn set_name(&mut self, name: &str) {
        let fonts = self.properties.get_or_insert_child("w:rFonts", RPR_ORDER);
        fonts.attributes.retain(|(k, _)| k != "w:asciiTheme" && k != "w:hAnsiTheme");
        fonts.set_attr("w:ascii", name);
        fonts.set_attr("w:hAnsi", name);
    }

    /// Set the size in half-points.
    pub fn set_size_half_points(&mut self, half_points: u32) {
        self.properties
            .get_or_insert_child("w:sz", RPR_ORDER)
            .set_attr("w:val", half_points.to_string());
    }

    /// Apply a font name and size.
    pub fn apply(&mut self, spec: &FontSpec) {
        self.set_name(spec.name());
        self.set_size_half_points(spec.size.half_points());
    }
}
