/// Document - the main document part of a WordprocessingML package.
use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;
use crate::common::xml::escape::expand_entity;
use crate::ooxml::opc::{OpcPackage, PackURI};
use once_cell::sync::OnceCell;
use quick_xml::Reader;
use quick_xml::events::Event;

/// A Word document.
///
/// Holds the raw main document part and hands out its text and its markup
/// tree. The tree is built on first use and cached.
///
/// # Examples
///
/// ```rust,no_run
/// use litchi_layout::ooxml::docx::Document;
///
/// let bytes = std::fs::read("document.docx")?;
/// let doc = Document::load(&bytes)?;
/// println!("{}", doc.text()?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Document {
    /// Partname of the main document part
    partname: PackURI,
    /// Raw XML of the main document part
    xml_bytes: Vec<u8>,
    /// Parsed markup, built lazily
    markup: OnceCell<XmlElement>,
}

impl Document {
    /// Open a package from raw bytes and load its main document.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let package = OpcPackage::from_bytes(bytes)?;
        Self::from_package(&package)
    }

    /// Load the main document of an opened package.
    ///
    /// The main part is the target of the package `officeDocument`
    /// relationship, or `word/document.xml` when there is none.
    pub fn from_package(package: &OpcPackage) -> Result<Self> {
        let partname = package.main_document_partname()?;
        let xml_bytes = package.blob(partname.membername())?.to_vec();
        Ok(Self {
            partname,
            xml_bytes,
            markup: OnceCell::new(),
        })
    }

    /// Partname of the main document part (e.g. `/word/document.xml`).
    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    /// Raw XML of the main document part.
    #[inline]
    pub fn xml_bytes(&self) -> &[u8] {
        &self.xml_bytes
    }

    /// Markup tree of the main document part.
    pub fn markup(&self) -> Result<&XmlElement> {
        self.markup
            .get_or_try_init(|| XmlElement::parse(&self.xml_bytes))
    }

    /// Get all text content from the document.
    ///
    /// Text of `w:t` elements, one line per top-level paragraph.
    pub fn text(&self) -> Result<String> {
        let mut reader = Reader::from_reader(self.xml_bytes.as_slice());
        reader.config_mut().trim_text(false);

        let mut result = String::with_capacity(self.xml_bytes.len() / 8);
        let mut paragraph_depth = 0usize;
        let mut paragraphs = 0usize;
        let mut in_text_element = false;
        let mut buf = Vec::with_capacity(512);

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"p" => {
                        if paragraph_depth == 0 {
                            if paragraphs > 0 {
                                result.push('\n');
                            }
                            paragraphs += 1;
                        }
                        paragraph_depth += 1;
                    },
                    b"t" => in_text_element = true,
                    _ => {},
                },
                Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == b"p" && paragraph_depth == 0 {
                        if paragraphs > 0 {
                            result.push('\n');
                        }
                        paragraphs += 1;
                    }
                },
                Ok(Event::Text(e)) if in_text_element => {
                    result.push_str(std::str::from_utf8(&e)?);
                },
                Ok(Event::GeneralRef(e)) if in_text_element => match e.resolve_char_ref()? {
                    Some(ch) => result.push(ch),
                    None => result.push_str(&expand_entity(std::str::from_utf8(&e)?)),
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"p" => paragraph_depth = paragraph_depth.saturating_sub(1),
                    b"t" => in_text_element = false,
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::XmlError(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        Ok(result)
    }

    /// Count the top-level paragraphs in the document.
    pub fn paragraph_count(&self) -> Result<usize> {
        Ok(self.markup()?.top_level("w:p").len())
    }
}
