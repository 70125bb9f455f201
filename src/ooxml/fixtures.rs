//! In-memory `.docx` packages for tests.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::ooxml::opc::constants::{namespace, relationship_type};

/// Namespace declarations used by every generated WordprocessingML part.
pub const WML_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
    r#"xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#
);

/// A small theme with distinct Latin and East Asian typefaces.
pub const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="44546A"/></a:dk2>
      <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
      <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
      <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
      <a:hlink><a:srgbClr val="0563C1"/></a:hlink>
      <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Office">
      <a:majorFont>
        <a:latin typeface="Calibri Light"/>
        <a:ea typeface="DengXian Light"/>
        <a:cs typeface=""/>
      </a:majorFont>
      <a:minorFont>
        <a:latin typeface="Calibri"/>
        <a:ea typeface="DengXian"/>
        <a:cs typeface=""/>
      </a:minorFont>
    </a:fontScheme>
  </a:themeElements>
</a:theme>"#;

/// Section properties for a page of the given size in dxa.
///
/// `references` is inserted verbatim before `w:pgSz`, typically
/// `w:headerReference`/`w:footerReference` elements.
pub fn section_xml(width: u32, height: u32, references: &str) -> String {
    format!(
        concat!(
            r#"<w:sectPr>{}<w:pgSz w:w="{}" w:h="{}"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" "#,
            r#"w:header="851" w:footer="992" w:gutter="0"/></w:sectPr>"#
        ),
        references, width, height
    )
}

/// Paragraph with a single plain run.
pub fn paragraph_xml(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

/// Builder for a minimal but well-formed WordprocessingML package.
pub struct DocxBuilder {
    main_part: String,
    body: String,
    theme: bool,
    relationships: Vec<(String, String, String)>,
    parts: Vec<(String, String)>,
}

impl Default for DocxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxBuilder {
    /// A4 portrait document with two paragraphs and a theme.
    pub fn new() -> Self {
        let body = format!(
            "{}{}{}",
            paragraph_xml("Hello"),
            paragraph_xml("World"),
            section_xml(11906, 16838, "")
        );
        Self {
            main_part: "word/document.xml".to_string(),
            body,
            theme: true,
            relationships: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// Replace the inner XML of `w:body`.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Store the main document under another member of `word/`.
    pub fn main_part(mut self, name: &str) -> Self {
        self.main_part = name.to_string();
        self
    }

    /// Omit the theme part and its relationship.
    pub fn without_theme(mut self) -> Self {
        self.theme = false;
        self
    }

    /// Add a relationship from the main document.
    pub fn relationship(mut self, id: &str, reltype: &str, target: &str) -> Self {
        self.relationships
            .push((id.to_string(), reltype.to_string(), target.to_string()));
        self
    }

    /// Add an arbitrary part.
    pub fn part(mut self, name: &str, xml: impl Into<String>) -> Self {
        self.parts.push((name.to_string(), xml.into()));
        self
    }

    /// Add a header part under `word/` and the relationship pointing to it.
    pub fn header(self, id: &str, file: &str, inner: &str) -> Self {
        let xml = format!(r#"<?xml version="1.0"?><w:hdr {}>{}</w:hdr>"#, WML_NAMESPACES, inner);
        self.relationship(id, relationship_type::HEADER, file)
            .part(&format!("word/{}", file), xml)
    }

    /// Add a footer part under `word/` and the relationship pointing to it.
    pub fn footer(self, id: &str, file: &str, inner: &str) -> Self {
        let xml = format!(r#"<?xml version="1.0"?><w:ftr {}>{}</w:ftr>"#, WML_NAMESPACES, inner);
        self.relationship(id, relationship_type::FOOTER, file)
            .part(&format!("word/{}", file), xml)
    }

    /// Serialize the package.
    pub fn build(self) -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let cursor = Cursor::new(&mut zip_data);
            let mut writer = ZipWriter::new(cursor);
            let options = SimpleFileOptions::default();

            let content_types = r#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/{}" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;
            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(content_types.replace("{}", &self.main_part).as_bytes()).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(format!(
                r#"<?xml version="1.0"?><Relationships xmlns="{}"><Relationship Id="rId1" Type="{}" Target="{}"/></Relationships>"#,
                namespace::OPC_RELATIONSHIPS, relationship_type::OFFICE_DOCUMENT, self.main_part
            ).as_bytes()).unwrap();

            let document = format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
                WML_NAMESPACES, self.body
            );
            writer.start_file(self.main_part.as_str(), options).unwrap();
            writer.write_all(document.as_bytes()).unwrap();

            let mut rels = format!(
                r#"<?xml version="1.0"?><Relationships xmlns="{}">"#,
                namespace::OPC_RELATIONSHIPS
            );
            if self.theme {
                rels.push_str(&format!(
                    r#"<Relationship Id="rIdTheme" Type="{}" Target="theme/theme1.xml"/>"#,
                    relationship_type::THEME
                ));
            }
            for (id, reltype, target) in &self.relationships {
                rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                    id, reltype, target
                ));
            }
            rels.push_str("</Relationships>");
            let (dir, file) = self.main_part.rsplit_once('/').unwrap_or(("", self.main_part.as_str()));
            writer.start_file(format!("{}/_rels/{}.rels", dir, file), options).unwrap();
            writer.write_all(rels.as_bytes()).unwrap();

            if self.theme {
                writer.start_file("word/theme/theme1.xml", options).unwrap();
                writer.write_all(THEME_XML.as_bytes()).unwrap();
            }

            for (name, xml) in &self.parts {
                writer.start_file(name.as_str(), options).unwrap();
                writer.write_all(xml.as_bytes()).unwrap();
            }

            writer.finish().unwrap();
        }
        zip_data
    }
}
