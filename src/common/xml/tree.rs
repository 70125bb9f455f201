//! Queryable element tree built from a quick-xml event stream.
//!
//! Streaming parsers are the right tool for scanning large parts once, but the
//! header/footer extraction needs to remove subtrees and re-query paragraphs,
//! so parts handed to stages are materialized as a small owned tree.
//! Element and attribute names keep their prefixes (`w:p`, `r:id`).

use crate::common::error::{Error, Result};
use crate::common::xml::escape::expand_entity;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    name: String,
    attributes: SmallVec<[(String, String); 4]>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a complete document and return its root element.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    stack.push(Self::from_start(e)?);
                },
                Ok(Event::Empty(ref e)) => {
                    let element = Self::from_start(e)?;
                    Self::attach(&mut stack, &mut root, element);
                },
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unbalanced end tag".to_string()))?;
                    Self::attach(&mut stack, &mut root, element);
                },
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(std::str::from_utf8(e)?);
                    }
                },
                Ok(Event::CData(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(std::str::from_utf8(e)?);
                    }
                },
                Ok(Event::GeneralRef(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        match e.resolve_char_ref()? {
                            Some(ch) => parent.push_text(ch.encode_utf8(&mut [0u8; 4])),
                            None => parent.push_text(&expand_entity(std::str::from_utf8(e)?)),
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlError(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("Unexpected end of document".to_string()));
        }
        root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut element = Self::new(std::str::from_utf8(e.name().as_ref())?);
        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            element
                .attributes
                .push((key, attr.unescape_value()?.to_string()));
        }
        Ok(element)
    }

    fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            },
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Qualified name, e.g. `w:pgSz`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Value of an attribute by qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All child nodes, including text.
    pub fn nodes(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements in document order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children().find(|c| c.name == name)
    }

    /// All descendant elements in document order (pre-order, excluding `self`).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children().rev().collect(),
        }
    }

    /// First descendant element with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.descendants().find(|e| e.name == name)
    }

    /// All descendant elements with the given name.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.descendants().filter(move |e| e.name == name)
    }

    /// Whether any descendant has the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Concatenated text of the whole subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Concatenated text of every descendant element with the given name,
    /// e.g. `text_of("w:t")` for the visible text of a paragraph.
    pub fn text_of(&self, name: &str) -> String {
        let mut out = String::new();
        for element in self.find_all(name) {
            element.collect_text(&mut out);
        }
        out
    }

    /// Copy of this element with every descendant subtree of the given name removed.
    pub fn without(&self, name: &str) -> XmlElement {
        XmlElement {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: self
                .children
                .iter()
                .filter_map(|node| match node {
                    XmlNode::Element(e) if e.name == name => None,
                    XmlNode::Element(e) => Some(XmlNode::Element(e.without(name))),
                    XmlNode::Text(t) => Some(XmlNode::Text(t.clone())),
                })
                .collect(),
        }
    }

    /// Descendants with the given name that are not nested inside another
    /// element of the same name.
    pub fn top_level(&self, name: &str) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        Self::collect_top_level(self, name, &mut out);
        out
    }

    fn collect_top_level<'a>(element: &'a XmlElement, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in element.children() {
            if child.name == name {
                out.push(child);
            } else {
                Self::collect_top_level(child, name, out);
            }
        }
    }
}

/// Pre-order iterator over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children().rev());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPHS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:hdr xmlns:w="urn:w" xmlns:mc="urn:mc">
  <w:p>
    <w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">Tom &amp; </w:t></w:r>
    <w:r><w:t>Jerry&#x21;</w:t></w:r>
  </w:p>
  <w:p>
    <w:r><mc:AlternateContent><mc:Choice><w:p><w:r><w:t>shape</w:t></w:r></w:p></mc:Choice></mc:AlternateContent></w:r>
    <w:r><w:t>after</w:t></w:r>
  </w:p>
</w:hdr>"#;

    #[test]
    fn test_parse_and_query() {
        let root = XmlElement::parse(PARAGRAPHS.as_bytes()).unwrap();
        assert_eq!(root.name(), "w:hdr");
        assert_eq!(root.local_name(), "hdr");
        assert_eq!(root.children().count(), 2);

        let first = root.child("w:p").unwrap();
        assert_eq!(first.text_of("w:t"), "Tom & Jerry!");
        assert!(first.find("w:rPr").unwrap().contains("w:b"));

        let t = first.find("w:t").unwrap();
        assert_eq!(t.attr("xml:space"), Some("preserve"));
        assert_eq!(t.attr("space"), None);
    }

    #[test]
    fn test_top_level_skips_nested() {
        let root = XmlElement::parse(PARAGRAPHS.as_bytes()).unwrap();
        assert_eq!(root.find_all("w:p").count(), 3);
        assert_eq!(root.top_level("w:p").len(), 2);
    }

    #[test]
    fn test_without() {
        let root = XmlElement::parse(PARAGRAPHS.as_bytes()).unwrap();
        let second = root.top_level("w:p")[1];
        assert!(second.contains("mc:AlternateContent"));
        assert_eq!(second.text_of("w:t"), "shapeafter");

        let cleaned = second.without("mc:AlternateContent");
        assert!(!cleaned.contains("mc:AlternateContent"));
        assert_eq!(cleaned.text_of("w:t"), "after");
    }

    #[test]
    fn test_descendants_order() {
        let root = XmlElement::parse(b"<a><b><c/></b><d/></a>").unwrap();
        let names: Vec<&str> = root.descendants().map(|e| e.name()).collect();
        assert_eq!(names, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_malformed() {
        assert!(XmlElement::parse(b"<a><b></a>").is_err());
        assert!(XmlElement::parse(b"   ").is_err());
    }
}
