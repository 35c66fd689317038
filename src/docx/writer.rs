//! Renders the intermediate document model as a DOCX package.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Alignment, Block, Document, InlineContent, Page, Paragraph, Table, TextRun};

use super::package::{
    DocxPackage, CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, STYLES_PART,
};
use super::xml::{Element, XmlDocument, W_NS};

const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(super) const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub(super) const OFFICE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(super) const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";

/// Options for rendering DOCX output.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Font of the document defaults, used where a run names no font
    pub default_font: String,
    /// Size of the document defaults in points
    pub default_font_size: f32,
    /// Page margin on every side, in points
    pub margin: f32,
    /// Start each PDF page on a new page
    pub page_breaks: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            default_font: "Calibri".to_string(),
            default_font_size: 11.0,
            margin: 72.0,
            page_breaks: true,
        }
    }
}

impl WriterOptions {
    /// Create default writer options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default font and size.
    pub fn with_default_font(mut self, name: impl Into<String>, size: f32) -> Self {
        self.default_font = name.into();
        self.default_font_size = size;
        self
    }

    /// Set the page margin in points.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Run pages together instead of breaking between them.
    pub fn continuous(mut self) -> Self {
        self.page_breaks = false;
        self
    }
}

/// Writes [`Document`]s as DOCX.
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    options: WriterOptions,
}

impl DocxWriter {
    /// Create a writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriterOptions) -> Self {
        Self { options }
    }

    /// Build every part of the package.
    pub fn render(&self, doc: &Document) -> Result<DocxPackage> {
        let mut package = DocxPackage::new();
        package.set_part(CONTENT_TYPES_PART, content_types().to_bytes()?);
        package.set_part("_rels/.rels", package_rels().to_bytes()?);
        package.set_part("docProps/core.xml", core_properties(doc, Utc::now()).to_bytes()?);
        package.set_part("docProps/app.xml", app_properties(doc).to_bytes()?);
        package.set_part(DOCUMENT_PART, self.document_part(doc).to_bytes()?);
        package.set_part(STYLES_PART, self.styles_part().to_bytes()?);
        package.set_part("word/settings.xml", settings_part().to_bytes()?);
        package.set_part(DOCUMENT_RELS_PART, document_rels().to_bytes()?);

        log::debug!(
            "rendered {} page(s) into {} package part(s)",
            doc.page_count(),
            package.part_names().count()
        );
        Ok(package)
    }

    /// Render to DOCX bytes.
    pub fn to_bytes(&self, doc: &Document) -> Result<Vec<u8>> {
        self.render(doc)?.to_bytes()
    }

    /// Render and write to a file.
    pub fn write_to_path<P: AsRef<Path>>(&self, doc: &Document, path: P) -> Result<()> {
        self.render(doc)?.save(path)
    }

    fn document_part(&self, doc: &Document) -> XmlDocument {
        let mut body = Element::new("w:body");
        let first = doc.pages.first().cloned().unwrap_or_default();
        let text_width = (first.width - 2.0 * self.options.margin).max(72.0);

        for (i, page) in doc.pages.iter().enumerate() {
            if i > 0 && self.options.page_breaks {
                body.push(page_break());
            }
            self.render_page(&mut body, page, text_width);
        }

        body.push(self.section_properties(&first));

        XmlDocument::new(
            Element::new("w:document")
                .with_attr("xmlns:w", W_NS)
                .with_attr("xmlns:r", R_NS)
                .with_child(body),
        )
    }

    fn render_page(&self, body: &mut Element, page: &Page, text_width: f32) {
        for (i, block) in page.elements.iter().enumerate() {
            match block {
                Block::Paragraph(p) => body.push(paragraph(p)),
                Block::Table(t) => {
                    body.push(table(t, text_width));
                    // Adjacent tables would merge, and a page must not end in one.
                    let next_is_table = page.elements.get(i + 1).map_or(true, Block::is_table);
                    if next_is_table {
                        body.push(Element::new("w:p"));
                    }
                }
            }
        }
    }

    fn section_properties(&self, page: &Page) -> Element {
        let margin = twips(self.options.margin).to_string();
        let mut size = Element::new("w:pgSz")
            .with_attr("w:w", twips(page.width).to_string())
            .with_attr("w:h", twips(page.height).to_string());
        if page.is_landscape() {
            size.set_attr("w:orient", "landscape");
        }

        Element::new("w:sectPr")
            .with_child(size)
            .with_child(
                Element::new("w:pgMar")
                    .with_attr("w:top", margin.as_str())
                    .with_attr("w:right", margin.as_str())
                    .with_attr("w:bottom", margin.as_str())
                    .with_attr("w:left", margin.as_str())
                    .with_attr("w:header", "720")
                    .with_attr("w:footer", "720")
                    .with_attr("w:gutter", "0"),
            )
            .with_child(Element::new("w:cols").with_attr("w:space", "720"))
            .with_child(Element::new("w:docGrid").with_attr("w:linePitch", "360"))
    }

    fn styles_part(&self) -> XmlDocument {
        let font = self.options.default_font.as_str();
        let size = half_points(self.options.default_font_size).to_string();

        let doc_defaults = Element::new("w:docDefaults")
            .with_child(
                Element::new("w:rPrDefault").with_child(
                    Element::new("w:rPr")
                        .with_child(
                            Element::new("w:rFonts")
                                .with_attr("w:ascii", font)
                                .with_attr("w:hAnsi", font)
                                .with_attr("w:eastAsia", font)
                                .with_attr("w:cs", font),
                        )
                        .with_child(Element::new("w:sz").with_attr("w:val", size.as_str()))
                        .with_child(Element::new("w:szCs").with_attr("w:val", size.as_str()))
                        .with_child(Element::new("w:lang").with_attr("w:val", "en-US")),
                ),
            )
            .with_child(
                Element::new("w:pPrDefault").with_child(
                    Element::new("w:pPr").with_child(
                        Element::new("w:spacing")
                            .with_attr("w:after", "0")
                            .with_attr("w:line", "240")
                            .with_attr("w:lineRule", "auto"),
                    ),
                ),
            );

        let normal = style("paragraph", "Normal", "Normal", true).with_child(Element::new("w:qFormat"));

        let paragraph_font = style("character", "DefaultParagraphFont", "Default Paragraph Font", true)
            .with_child(Element::new("w:uiPriority").with_attr("w:val", "1"))
            .with_child(Element::new("w:semiHidden"))
            .with_child(Element::new("w:unhideWhenUsed"));

        let normal_table = style("table", "TableNormal", "Normal Table", true)
            .with_child(Element::new("w:uiPriority").with_attr("w:val", "99"))
            .with_child(Element::new("w:semiHidden"))
            .with_child(Element::new("w:unhideWhenUsed"))
            .with_child(
                Element::new("w:tblPr")
                    .with_child(dxa("w:tblInd", 0))
                    .with_child(
                        Element::new("w:tblCellMar")
                            .with_child(dxa("w:top", 0))
                            .with_child(dxa("w:left", 108))
                            .with_child(dxa("w:bottom", 0))
                            .with_child(dxa("w:right", 108)),
                    ),
            );

        let mut borders = Element::new("w:tblBorders");
        for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            borders.push(
                Element::new(edge)
                    .with_attr("w:val", "single")
                    .with_attr("w:sz", "4")
                    .with_attr("w:space", "0")
                    .with_attr("w:color", "auto"),
            );
        }
        let table_grid = style("table", "TableGrid", "Table Grid", false)
            .with_child(Element::new("w:basedOn").with_attr("w:val", "TableNormal"))
            .with_child(Element::new("w:uiPriority").with_attr("w:val", "59"))
            .with_child(Element::new("w:tblPr").with_child(borders));

        XmlDocument::new(
            Element::new("w:styles")
                .with_attr("xmlns:w", W_NS)
                .with_child(doc_defaults)
                .with_child(normal)
                .with_child(paragraph_font)
                .with_child(normal_table)
                .with_child(table_grid),
        )
    }
}

fn style(kind: &str, id: &str, name: &str, default: bool) -> Element {
    let mut style = Element::new("w:style").with_attr("w:type", kind);
    if default {
        style.set_attr("w:default", "1");
    }
    style.set_attr("w:styleId", id);
    style.with_child(Element::new("w:name").with_attr("w:val", name))
}

fn dxa(name: &str, value: i64) -> Element {
    Element::new(name)
        .with_attr("w:w", value.to_string())
        .with_attr("w:type", "dxa")
}

fn page_break() -> Element {
    Element::new("w:p").with_child(
        Element::new("w:r").with_child(Element::new("w:br").with_attr("w:type", "page")),
    )
}

fn paragraph(p: &Paragraph) -> Element {
    let mut element = Element::new("w:p");

    let mut ppr = Element::new("w:pPr");
    if let Some(before) = p.style.space_before {
        ppr.push(Element::new("w:spacing").with_attr("w:before", twips(before).to_string()));
    }
    if let Some(indent) = p.style.indent_left {
        ppr.push(Element::new("w:ind").with_attr("w:left", twips(indent).to_string()));
    }
    match p.style.alignment {
        Alignment::Left => {}
        Alignment::Center => ppr.push(Element::new("w:jc").with_attr("w:val", "center")),
        Alignment::Right => ppr.push(Element::new("w:jc").with_attr("w:val", "right")),
    }
    if !ppr.children.is_empty() {
        element.push(ppr);
    }

    for content in &p.content {
        match content {
            InlineContent::Text(run) if !run.is_empty() => element.push(text_run(run)),
            InlineContent::Text(_) => {}
            InlineContent::LineBreak => {
                element.push(Element::new("w:r").with_child(Element::new("w:br")))
            }
        }
    }

    element
}

fn text_run(run: &TextRun) -> Element {
    let mut element = Element::new("w:r");

    let mut rpr = Element::new("w:rPr");
    if let Some(font) = &run.style.font_name {
        rpr.push(
            Element::new("w:rFonts")
                .with_attr("w:ascii", font.as_str())
                .with_attr("w:hAnsi", font.as_str()),
        );
    }
    if run.style.bold {
        rpr.push(Element::new("w:b"));
    }
    if run.style.italic {
        rpr.push(Element::new("w:i"));
    }
    if let Some(size) = run.style.font_size {
        let size = half_points(size).to_string();
        rpr.push(Element::new("w:sz").with_attr("w:val", size.as_str()));
        rpr.push(Element::new("w:szCs").with_attr("w:val", size.as_str()));
    }
    if !rpr.children.is_empty() {
        element.push(rpr);
    }

    element.push(
        Element::new("w:t")
            .with_attr("xml:space", "preserve")
            .with_text(&run.text),
    );
    element
}

fn table(t: &Table, text_width: f32) -> Element {
    let columns = t.column_count().max(1);
    let widths = column_widths(t, columns, text_width);
    let total: i64 = widths.iter().sum();

    let mut grid = Element::new("w:tblGrid");
    for w in &widths {
        grid.push(Element::new("w:gridCol").with_attr("w:w", w.to_string()));
    }

    let mut element = Element::new("w:tbl")
        .with_child(
            Element::new("w:tblPr")
                .with_child(Element::new("w:tblStyle").with_attr("w:val", "TableGrid"))
                .with_child(dxa("w:tblW", total))
                .with_child(Element::new("w:tblLayout").with_attr("w:type", "fixed"))
                .with_child(
                    Element::new("w:tblLook")
                        .with_attr("w:val", "04A0")
                        .with_attr("w:firstRow", "1")
                        .with_attr("w:lastRow", "0")
                        .with_attr("w:firstColumn", "1")
                        .with_attr("w:lastColumn", "0")
                        .with_attr("w:noHBand", "0")
                        .with_attr("w:noVBand", "1"),
                ),
        )
        .with_child(grid);

    for row in &t.rows {
        let mut tr = Element::new("w:tr");
        for (i, width) in widths.iter().enumerate() {
            let mut tc = Element::new("w:tc")
                .with_child(Element::new("w:tcPr").with_child(dxa("w:tcW", *width)));
            let paragraphs = row.cells.get(i).map(|c| c.content.as_slice()).unwrap_or(&[]);
            for p in paragraphs {
                tc.push(paragraph(p));
            }
            // A cell must end with a paragraph.
            if paragraphs.is_empty() {
                tc.push(Element::new("w:p"));
            }
            tr.push(tc);
        }
        element.push(tr);
    }

    element
}

/// Column widths in twips, scaled down to fit the text area.
fn column_widths(t: &Table, columns: usize, text_width: f32) -> Vec<i64> {
    let mut widths: Vec<f32> = match &t.column_widths {
        Some(w) if w.len() == columns => w.clone(),
        _ => vec![text_width / columns as f32; columns],
    };

    let sum: f32 = widths.iter().sum();
    if sum > text_width {
        let scale = text_width / sum;
        widths.iter_mut().for_each(|w| *w *= scale);
    }
    widths.into_iter().map(twips).collect()
}

fn content_types() -> XmlDocument {
    const MAIN: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml";
    let default = |ext: &str, ty: &str| {
        Element::new("Default")
            .with_attr("Extension", ext)
            .with_attr("ContentType", ty)
    };
    let part = |name: &str, ty: String| {
        Element::new("Override")
            .with_attr("PartName", name)
            .with_attr("ContentType", ty)
    };

    XmlDocument::new(
        Element::new("Types")
            .with_attr("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")
            .with_child(default("rels", "application/vnd.openxmlformats-package.relationships+xml"))
            .with_child(default("xml", "application/xml"))
            .with_child(part("/word/document.xml", format!("{MAIN}.document.main+xml")))
            .with_child(part("/word/styles.xml", STYLES_CONTENT_TYPE.to_string()))
            .with_child(part("/word/settings.xml", format!("{MAIN}.settings+xml")))
            .with_child(part(
                "/docProps/core.xml",
                "application/vnd.openxmlformats-package.core-properties+xml".to_string(),
            ))
            .with_child(part(
                "/docProps/app.xml",
                "application/vnd.openxmlformats-officedocument.extended-properties+xml".to_string(),
            )),
    )
}

fn relationship(id: &str, kind: &str, target: &str) -> Element {
    Element::new("Relationship")
        .with_attr("Id", id)
        .with_attr("Type", kind)
        .with_attr("Target", target)
}

fn package_rels() -> XmlDocument {
    XmlDocument::new(
        Element::new("Relationships")
            .with_attr("xmlns", PKG_REL_NS)
            .with_child(relationship(
                "rId1",
                &format!("{OFFICE_REL}/officeDocument"),
                "word/document.xml",
            ))
            .with_child(relationship(
                "rId2",
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
                "docProps/core.xml",
            ))
            .with_child(relationship(
                "rId3",
                &format!("{OFFICE_REL}/extended-properties"),
                "docProps/app.xml",
            )),
    )
}

fn document_rels() -> XmlDocument {
    XmlDocument::new(
        Element::new("Relationships")
            .with_attr("xmlns", PKG_REL_NS)
            .with_child(relationship("rId1", &format!("{OFFICE_REL}/styles"), "styles.xml"))
            .with_child(relationship("rId2", &format!("{OFFICE_REL}/settings"), "settings.xml")),
    )
}

fn settings_part() -> XmlDocument {
    XmlDocument::new(
        Element::new("w:settings")
            .with_attr("xmlns:w", W_NS)
            .with_child(Element::new("w:defaultTabStop").with_attr("w:val", "720"))
            .with_child(Element::new("w:characterSpacingControl").with_attr("w:val", "doNotCompress"))
            .with_child(
                Element::new("w:compat").with_child(
                    Element::new("w:compatSetting")
                        .with_attr("w:name", "compatibilityMode")
                        .with_attr("w:uri", "http://schemas.microsoft.com/office/word")
                        .with_attr("w:val", "15"),
                ),
            ),
    )
}

fn core_properties(doc: &Document, now: DateTime<Utc>) -> XmlDocument {
    let w3c = |t: DateTime<Utc>| t.format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let created = doc.metadata.created.unwrap_or(now);

    let mut root = Element::new("cp:coreProperties")
        .with_attr(
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        )
        .with_attr("xmlns:dc", "http://purl.org/dc/elements/1.1/")
        .with_attr("xmlns:dcterms", "http://purl.org/dc/terms/")
        .with_attr("xmlns:dcmitype", "http://purl.org/dc/dcmitype/")
        .with_attr("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance");

    let metadata = &doc.metadata;
    for (name, value) in [
        ("dc:title", &metadata.title),
        ("dc:subject", &metadata.subject),
        ("dc:creator", &metadata.author),
        ("cp:keywords", &metadata.keywords),
    ] {
        if let Some(value) = value {
            root.push(Element::new(name).with_text(value));
        }
    }

    root.push(Element::new("cp:lastModifiedBy").with_text(env!("CARGO_PKG_NAME")));
    root.push(
        Element::new("dcterms:created")
            .with_attr("xsi:type", "dcterms:W3CDTF")
            .with_text(&w3c(created)),
    );
    root.push(
        Element::new("dcterms:modified")
            .with_attr("xsi:type", "dcterms:W3CDTF")
            .with_text(&w3c(now)),
    );
    XmlDocument::new(root)
}

fn app_properties(doc: &Document) -> XmlDocument {
    XmlDocument::new(
        Element::new("Properties")
            .with_attr(
                "xmlns",
                "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
            )
            .with_attr(
                "xmlns:vt",
                "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes",
            )
            .with_child(Element::new("Application").with_text(env!("CARGO_PKG_NAME")))
            .with_child(Element::new("Pages").with_text(&doc.page_count().max(1).to_string())),
    )
}

/// Points to twentieths of a point.
pub fn twips(points: f32) -> i64 {
    (points * 20.0).round() as i64
}

/// Points to half-points, the unit of `w:sz`.
pub fn half_points(points: f32) -> u32 {
    (points * 2.0).round().max(1.0) as u32
}
