//! Minimal mutable XML tree for WordprocessingML parts.
//!
//! Parts are read with quick-xml into a tree that keeps every node it does
//! not understand (text, comments, processing instructions, unknown
//! elements), so writing a part back changes only what was edited.
//!
//! Names are kept qualified. Elements and attributes bound to the
//! WordprocessingML namespace are always held as `w:name`, whatever prefix
//! (or default namespace) the part used, and are written back the way the
//! part spelled them.

use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, QName, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::Writer;

use crate::error::{Error, Result};

/// WordprocessingML main namespace.
pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Declaration written at the top of every serialized part.
pub const XML_DECLARATION: &[u8] =
    b"<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root: Element,
    spelling: Spelling,
}

/// The prefixes a part used for the WordprocessingML namespace.
///
/// `element` is `Some("")` when the namespace was the default one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Spelling {
    element: Option<String>,
    attribute: Option<String>,
}

/// An XML element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name, e.g. `w:rPr`
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data, still escaped as it appeared in the source
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

impl XmlDocument {
    /// Wrap a root element.
    pub fn new(root: Element) -> Self {
        Self {
            root,
            spelling: Spelling::default(),
        }
    }

    /// Parse a part.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = NsReader::from_reader(data);
        reader.trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut spelling = Spelling::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(element_from_start(&reader, &e, &mut spelling)?),
                Event::Empty(e) => {
                    let element = element_from_start(&reader, &e, &mut spelling)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unexpected closing tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(t) => push_node(&mut stack, Node::Text(utf8(&t)?)),
                Event::CData(t) => push_node(&mut stack, Node::CData(utf8(&t)?)),
                Event::Comment(t) => push_node(&mut stack, Node::Comment(utf8(&t)?)),
                Event::PI(t) => push_node(&mut stack, Node::ProcessingInstruction(utf8(&t)?)),
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::Xml(format!("unclosed element <{}>", open.name)));
        }
        let root = root.ok_or_else(|| Error::Xml("document has no root element".to_string()))?;
        Ok(Self { root, spelling })
    }

    /// Serialize the part with a standalone UTF-8 declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(XML_DECLARATION.to_vec());
        let root = if self.spelling.needs_declaration() && self.root.attr("xmlns:w").is_none() {
            Cow::Owned(self.root.clone().with_attr("xmlns:w", W_NS))
        } else {
            Cow::Borrowed(&self.root)
        };
        write_element(&mut writer, &root, &self.spelling)?;
        Ok(writer.into_inner())
    }
}

impl Spelling {
    fn needs_declaration(&self) -> bool {
        self.attribute.is_none() && self.element.as_deref() == Some("")
    }

    fn attribute_prefix(&self) -> &str {
        match (self.attribute.as_deref(), self.element.as_deref()) {
            (Some(prefix), _) => prefix,
            (None, Some(prefix)) if !prefix.is_empty() => prefix,
            _ => "w",
        }
    }

    fn element_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match (name.strip_prefix("w:"), self.element.as_deref()) {
            (Some(local), Some("")) => Cow::Borrowed(local),
            (Some(local), Some(prefix)) if prefix != "w" => Cow::Owned(format!("{prefix}:{local}")),
            _ => Cow::Borrowed(name),
        }
    }

    fn attribute_name<'a>(&self, key: &'a str) -> Cow<'a, str> {
        let prefix = self.attribute_prefix();
        match key.strip_prefix("w:") {
            Some(local) if prefix != "w" => Cow::Owned(format!("{prefix}:{local}")),
            _ => Cow::Borrowed(key),
        }
    }
}

fn element_from_start(
    reader: &NsReader<&[u8]>,
    start: &BytesStart,
    spelling: &mut Spelling,
) -> Result<Element> {
    let qname = start.name();
    let name = match reader.resolve_element(qname) {
        (ResolveResult::Bound(Namespace(ns)), local) if ns == W_NS.as_bytes() => {
            spelling.element.get_or_insert(prefix_of(qname)?);
            format!("w:{}", std::str::from_utf8(local.as_ref()).map_err(xml_err)?)
        }
        _ => utf8(qname.as_ref())?,
    };

    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = match reader.resolve_attribute(attr.key) {
            (ResolveResult::Bound(Namespace(ns)), local) if ns == W_NS.as_bytes() => {
                spelling.attribute.get_or_insert(prefix_of(attr.key)?);
                format!("w:{}", std::str::from_utf8(local.as_ref()).map_err(xml_err)?)
            }
            _ => utf8(attr.key.as_ref())?,
        };
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn prefix_of(name: QName) -> Result<String> {
    match name.prefix() {
        Some(prefix) => utf8(prefix.as_ref()),
        None => Ok(String::new()),
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(Error::Xml("multiple root elements".to_string()));
    }
    Ok(())
}

/// Nodes outside the root element are dropped.
fn push_node(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes).map(str::to_string).map_err(xml_err)
}

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::Xml(e.to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element, spelling: &Spelling) -> Result<()> {
    let name = spelling.element_name(&element.name);
    let mut start = BytesStart::new(name.as_ref());
    for (key, value) in &element.attributes {
        start.push_attribute((spelling.attribute_name(key).as_ref(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in &element.children {
        let event = match child {
            Node::Element(e) => {
                write_element(writer, e, spelling)?;
                continue;
            }
            Node::Text(t) => Event::Text(BytesText::from_escaped(t.as_str())),
            Node::CData(t) => Event::CData(BytesCData::new(t.as_str())),
            Node::Comment(t) => Event::Comment(BytesText::from_escaped(t.as_str())),
            Node::ProcessingInstruction(t) => Event::PI(BytesText::from_escaped(t.as_str())),
        };
        writer.write_event(event).map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_ref())))
        .map_err(xml_err)?;
    Ok(())
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder: add a child element.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder: add character data (escaped on the way in).
    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(Node::Text(escape(text).into_owned()));
        self
    }

    /// Append a child element.
    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Attribute value by qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Direct child elements named `name`.
    pub fn child_elements<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// Mutable direct child elements named `name`.
    pub fn child_elements_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.children.iter_mut().filter_map(move |n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// All direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child element named `name`.
    pub fn find_child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// First direct child element named `name`, mutably.
    pub fn find_child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Return the child named `name`, inserting an empty one if missing.
    ///
    /// `order` lists sibling names in schema sequence; a new child goes
    /// before the first existing sibling that comes later in `order`, or at
    /// the end when no such sibling exists.
    pub fn get_or_insert_child(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let rank = |n: &str| order.iter().position(|o| *o == n);
        let existing = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == name));

        let index = match existing {
            Some(index) => index,
            None => {
                let at = rank(name)
                    .and_then(|own| {
                        self.children.iter().position(|n| match n {
                            Node::Element(e) => rank(&e.name).is_some_and(|r| r > own),
                            _ => false,
                        })
                    })
                    .unwrap_or(self.children.len());
                self.children.insert(at, Node::Element(Element::new(name)));
                at
            }
        };
        element_at(&mut self.children, index, name)
    }

    /// Return the child named `name`, inserting it as the first child if missing.
    pub fn get_or_insert_first_child(&mut self, name: &str) -> &mut Element {
        let index = match self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == name))
        {
            Some(index) => index,
            None => {
                self.children.insert(0, Node::Element(Element::new(name)));
                0
            }
        };
        element_at(&mut self.children, index, name)
    }

    /// Concatenated, unescaped text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Element(e) => e.collect_text(out),
                Node::Text(t) => out.push_str(&unescape(t).unwrap_or(Cow::Borrowed(t.as_str()))),
                Node::CData(t) => out.push_str(t),
                Node::Comment(_) | Node::ProcessingInstruction(_) => {}
            }
        }
    }
}

fn element_at<'a>(children: &'a mut [Node], index: usize, name: &str) -> &'a mut Element {
    let node = &mut children[index];
    if !matches!(node, Node::Element(_)) {
        *node = Node::Element(Element::new(name));
    }
    match node {
        Node::Element(e) => e,
        _ => unreachable!("node was just replaced by an element"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><!-- note --><w:p><w:r><w:t xml:space="preserve">Fish &amp; chips </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_parse_structure() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.root.name, "w:document");
        assert_eq!(doc.root.local_name(), "document");

        let body = doc.root.find_child("w:body").unwrap();
        assert_eq!(body.child_elements("w:p").count(), 1);
        assert!(body.find_child("w:sectPr").unwrap().children.is_empty());
        assert_eq!(body.text(), "Fish & chips ");

        let t = body.find_child("w:p").unwrap().find_child("w:r").unwrap().find_child("w:t").unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_roundtrip_is_stable() {
        let doc = XmlDocument::parse(SAMPLE.as_bytes()).unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert!(bytes.starts_with(XML_DECLARATION));

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("Fish &amp; chips"));
        assert!(text.contains("<!-- note -->"));
        assert!(text.contains("<w:sectPr/>"));

        let again = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(again, doc);
        assert_eq!(again.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_attribute_escaping() {
        let root = Element::new("w:style").with_attr("w:styleId", "A&B \"quoted\"");
        let bytes = XmlDocument::new(root).to_bytes().unwrap();
        let parsed = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(parsed.root.attr("w:styleId"), Some("A&B \"quoted\""));
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut e = Element::new("w:sz").with_attr("w:val", "24");
        e.set_attr("w:val", "48");
        e.set_attr("w:other", "1");
        assert_eq!(e.attributes.len(), 2);
        assert_eq!(e.attr("w:val"), Some("48"));
    }

    #[test]
    fn test_get_or_insert_child_respects_order() {
        let order = ["w:rFonts", "w:b", "w:i", "w:color", "w:sz"];
        let mut rpr = Element::new("w:rPr")
            .with_child(Element::new("w:b"))
            .with_child(Element::new("w:color"));

        rpr.get_or_insert_child("w:sz", &order);
        rpr.get_or_insert_child("w:rFonts", &order);
        rpr.get_or_insert_child("w:i", &order).set_attr("w:val", "1");
        rpr.get_or_insert_child("w:b", &order);

        let names: Vec<&str> = rpr.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:rFonts", "w:b", "w:i", "w:color", "w:sz"]);
        assert_eq!(rpr.find_child("w:i").unwrap().attr("w:val"), Some("1"));
    }

    #[test]
    fn test_get_or_insert_first_child() {
        let mut run = Element::new("w:r").with_child(Element::new("w:t").with_text("x"));
        run.get_or_insert_first_child("w:rPr");
        run.get_or_insert_first_child("w:rPr");
        let names: Vec<&str> = run.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:rPr", "w:t"]);
    }

    #[test]
    fn test_foreign_prefix_is_held_as_w() {
        let source = format!(
            r#"<ns0:document xmlns:ns0="{W_NS}"><ns0:body><ns0:p><ns0:r><ns0:rPr><ns0:sz ns0:val="20"/></ns0:rPr></ns0:r></ns0:p></ns0:body></ns0:document>"#
        );
        let mut doc = XmlDocument::parse(source.as_bytes()).unwrap();
        assert_eq!(doc.root.name, "w:document");
        assert_eq!(doc.root.attr("xmlns:ns0"), Some(W_NS));

        let rpr = doc
            .root
            .find_child_mut("w:body")
            .and_then(|b| b.find_child_mut("w:p"))
            .and_then(|p| p.find_child_mut("w:r"))
            .and_then(|r| r.find_child_mut("w:rPr"))
            .unwrap();
        assert_eq!(rpr.find_child("w:sz").unwrap().attr("w:val"), Some("20"));
        rpr.push(Element::new("w:b").with_attr("w:val", "1"));

        let text = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(text.contains(r#"<ns0:sz ns0:val="20"/><ns0:b ns0:val="1"/>"#));
        assert!(!text.contains("w:"));
    }

    #[test]
    fn test_default_namespace_is_held_as_w() {
        let source = format!(r#"<document xmlns="{W_NS}"><body><p/></body></document>"#);
        let mut doc = XmlDocument::parse(source.as_bytes()).unwrap();
        let body = doc.root.find_child_mut("w:body").unwrap();
        body.push(Element::new("w:sectPr").with_attr("w:rsidR", "00AB"));

        let bytes = doc.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains(&format!(r#"<document xmlns="{W_NS}" xmlns:w="{W_NS}">"#)));
        assert!(text.contains(r#"<body><p/><sectPr w:rsidR="00AB"/></body>"#));

        let again = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(again.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_other_namespaces_keep_their_names() {
        let source = format!(
            r#"<w:p xmlns:w="{W_NS}" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" w14:paraId="1A"><mc:Fallback xmlns:mc="urn:mc"/></w:p>"#
        );
        let doc = XmlDocument::parse(source.as_bytes()).unwrap();
        assert_eq!(doc.root.attr("w14:paraId"), Some("1A"));
        assert!(doc.root.find_child("mc:Fallback").is_some());
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(matches!(
            XmlDocument::parse(b"<w:document><w:body></w:document>"),
            Err(Error::Xml(_))
        ));
        assert!(matches!(XmlDocument::parse(b""), Err(Error::Xml(_))));
        assert!(matches!(
            XmlDocument::parse(b"<a/><b/>"),
            Err(Error::Xml(_))
        ));
    }
}
