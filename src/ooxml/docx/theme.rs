/// Theme support for Word documents.
///
/// Themes define the color scheme and font scheme that runs refer to
/// indirectly through `w:eastAsiaTheme`/`w:asciiTheme` and `w:themeColor`.
use crate::common::error::Result;
use crate::common::style::RGBColor;
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::relationship_type;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// Script used as the East Asian fallback when `a:ea` is blank.
const EAST_ASIAN_FALLBACK_SCRIPT: &str = "Hans";

/// Typefaces of one font collection (`a:majorFont` or `a:minorFont`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontCollection {
    /// Latin typeface (`a:latin`)
    pub latin: Option<String>,
    /// East Asian typeface (`a:ea`)
    pub east_asia: Option<String>,
    /// Complex script typeface (`a:cs`)
    pub complex_script: Option<String>,
}

/// Document theme containing the font scheme and color scheme.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    /// Theme name
    name: Option<String>,
    /// Major fonts (for headings)
    major: FontCollection,
    /// Minor fonts (for body text)
    minor: FontCollection,
    /// Color scheme name
    color_scheme: Option<String>,
    /// Scheme colors keyed by slot (`dk1`, `accent1`, `hlink`, ...)
    colors: HashMap<String, RGBColor>,
}

impl Theme {
    /// Get the theme name.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the major fonts (for headings).
    #[inline]
    pub fn major(&self) -> &FontCollection {
        &self.major
    }

    /// Get the minor fonts (for body text).
    #[inline]
    pub fn minor(&self) -> &FontCollection {
        &self.minor
    }

    /// Get the color scheme name.
    #[inline]
    pub fn color_scheme(&self) -> Option<&str> {
        self.color_scheme.as_deref()
    }

    /// Load the theme related to the main document, if the package has one.
    pub fn load(archive: &OpcPackage) -> Result<Option<Self>> {
        let document = archive.main_document_partname()?;
        let rels = archive.part_rels(&document)?;
        let Ok(rel) = rels.part_with_reltype(relationship_type::THEME) else {
            return Ok(None);
        };
        let partname = rel.target_partname()?;
        if !archive.contains(partname.membername()) {
            log::warn!("Theme part {} is referenced but missing", partname);
            return Ok(None);
        }
        Ok(Some(Self::from_xml(archive.blob(partname.membername())?)?))
    }

    /// Parse a theme part.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut theme = Self::default();
        let mut collection: Option<bool> = None; // Some(true) = major
        let mut in_color_scheme = false;
        let mut color_slot: Option<String> = None;
        let mut buf = Vec::with_capacity(1024);

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"theme" => theme.name = attr_value(e, b"name")?,
                    b"clrScheme" => {
                        in_color_scheme = true;
                        theme.color_scheme = attr_value(e, b"name")?;
                    },
                    b"majorFont" => collection = Some(true),
                    b"minorFont" => collection = Some(false),
                    b"latin" | b"ea" | b"cs" | b"font" => {
                        if let Some(is_major) = collection {
                            let fonts = if is_major {
                                &mut theme.major
                            } else {
                                &mut theme.minor
                            };
                            let typeface = attr_value(e, b"typeface")?.filter(|t| !t.is_empty());
                            match e.local_name().as_ref() {
                                b"latin" => fonts.latin = typeface,
                                b"ea" => fonts.east_asia = typeface,
                                b"cs" => fonts.complex_script = typeface,
                                _ => {
                                    let script = attr_value(e, b"script")?;
                                    if fonts.east_asia.is_none()
                                        && script.as_deref() == Some(EAST_ASIAN_FALLBACK_SCRIPT)
                                    {
                                        fonts.east_asia = typeface;
                                    }
                                },
                            }
                        }
                    },
                    b"srgbClr" => {
                        if let Some(slot) = &color_slot
                            && let Some(color) = attr_value(e, b"val")?.and_then(|v| RGBColor::from_hex(&v))
                        {
                            theme.colors.insert(slot.clone(), color);
                        }
                    },
                    b"sysClr" => {
                        if let Some(slot) = &color_slot
                            && let Some(color) =
                                attr_value(e, b"lastClr")?.and_then(|v| RGBColor::from_hex(&v))
                        {
                            theme.colors.insert(slot.clone(), color);
                        }
                    },
                    slot if in_color_scheme && color_slot.is_none() => {
                        color_slot = Some(String::from_utf8_lossy(slot).into_owned());
                    },
                    _ => {},
                },
                Event::End(ref e) => match e.local_name().as_ref() {
                    b"majorFont" | b"minorFont" => collection = None,
                    b"clrScheme" => in_color_scheme = false,
                    name if color_slot.as_deref().map(str::as_bytes) == Some(name) => {
                        color_slot = None;
                    },
                    _ => {},
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok(theme)
    }

    /// Resolve a theme font reference such as `minorEastAsia` or `majorHAnsi`.
    pub fn font(&self, reference: &str) -> Option<&str> {
        let (fonts, slot) = if let Some(slot) = reference.strip_prefix("major") {
            (&self.major, slot)
        } else if let Some(slot) = reference.strip_prefix("minor") {
            (&self.minor, slot)
        } else {
            return None;
        };

        match slot {
            "EastAsia" => fonts.east_asia.as_deref(),
            "HAnsi" | "Ascii" => fonts.latin.as_deref(),
            "Bidi" => fonts.complex_script.as_deref(),
            _ => None,
        }
    }

    /// Resolve a `w:themeColor` name (`accent1`, `text1`, `hyperlink`, ...)
    /// or a scheme slot name (`dk1`, `lt2`, ...).
    pub fn color(&self, name: &str) -> Option<RGBColor> {
        let slot = match name {
            "text1" | "dark1" => "dk1",
            "background1" | "light1" => "lt1",
            "text2" | "dark2" => "dk2",
            "background2" | "light2" => "lt2",
            "hyperlink" => "hlink",
            "followedHyperlink" => "folHlink",
            other => other,
        };
        self.colors.get(slot).copied()
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::fixtures::{DocxBuilder, THEME_XML};

    #[test]
    fn test_fonts() {
        let theme = Theme::from_xml(THEME_XML.as_bytes()).unwrap();
        assert_eq!(theme.name(), Some("Office Theme"));
        assert_eq!(theme.major().latin.as_deref(), Some("Calibri Light"));
        assert_eq!(theme.minor().east_asia.as_deref(), Some("DengXian"));
        assert_eq!(theme.minor().complex_script, None);

        assert_eq!(theme.font("minorEastAsia"), Some("DengXian"));
        assert_eq!(theme.font("majorEastAsia"), Some("DengXian Light"));
        assert_eq!(theme.font("majorHAnsi"), Some("Calibri Light"));
        assert_eq!(theme.font("minorBidi"), None);
        assert_eq!(theme.font("somethingElse"), None);
    }

    #[test]
    fn test_colors() {
        let theme = Theme::from_xml(THEME_XML.as_bytes()).unwrap();
        assert_eq!(theme.color_scheme(), Some("Office"));
        assert_eq!(theme.color("accent1"), Some(RGBColor::new(0x44, 0x72, 0xC4)));
        assert_eq!(theme.color("text1"), Some(RGBColor::new(0, 0, 0)));
        assert_eq!(theme.color("background1"), Some(RGBColor::new(0xFF, 0xFF, 0xFF)));
        assert_eq!(theme.color("hyperlink"), Some(RGBColor::new(0x05, 0x63, 0xC1)));
        assert_eq!(theme.color("accent6"), None);
    }

    #[test]
    fn test_east_asian_script_fallback() {
        let xml = r#"<a:theme xmlns:a="urn:a"><a:themeElements><a:fontScheme>
            <a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/>
            <a:font script="Jpan" typeface="Yu Mincho"/><a:font script="Hans" typeface="等线"/></a:minorFont>
            </a:fontScheme></a:themeElements></a:theme>"#;
        let theme = Theme::from_xml(xml.as_bytes()).unwrap();
        assert_eq!(theme.font("minorEastAsia"), Some("等线"));
    }

    #[test]
    fn test_load_from_package() {
        let pkg = OpcPackage::from_bytes(&DocxBuilder::new().build()).unwrap();
        assert!(Theme::load(&pkg).unwrap().is_some());

        let pkg = OpcPackage::from_bytes(&DocxBuilder::new().without_theme().build()).unwrap();
        assert!(Theme::load(&pkg).unwrap().is_none());
    }
}
