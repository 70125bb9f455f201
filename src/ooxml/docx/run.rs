/// Styled text runs extracted from headers and footers.
use crate::common::style::{ColorTransform, resolve_color};
use crate::common::xml::XmlElement;
use crate::ooxml::docx::fonts::DEFAULT_DISPLAY_FONT;
use crate::ooxml::docx::theme::Theme;
use serde::{Deserialize, Serialize};

/// Font size in points when a run declares none.
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Horizontal alignment of a run within its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowFlex {
    #[default]
    Left,
}

/// Character formatting of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    /// Size in whole points
    pub size: u32,
    /// Font family, theme references already resolved
    pub font: String,
    /// `#RRGGBB`
    pub color: String,
}

impl Default for RunStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            size: DEFAULT_FONT_SIZE,
            font: DEFAULT_DISPLAY_FONT.to_string(),
            color: resolve_color("", None),
        }
    }
}

impl RunStyle {
    /// Read the style of a `w:rPr` element.
    ///
    /// Toggle properties count as set when the element is present, whatever
    /// its `w:val`. A missing `w:rPr` gives the default style.
    pub fn from_properties(rpr: Option<&XmlElement>, theme: Option<&Theme>) -> Self {
        let Some(rpr) = rpr else {
            return Self::default();
        };

        Self {
            bold: rpr.contains("w:b"),
            italic: rpr.contains("w:i"),
            underline: rpr.contains("w:u"),
            strikeout: rpr.contains("w:strike"),
            size: font_size(rpr),
            font: font_name(rpr, theme),
            color: font_color(rpr, theme),
        }
    }
}

/// `w:sz` is in half-points.
fn font_size(rpr: &XmlElement) -> u32 {
    rpr.find("w:sz")
        .and_then(|sz| sz.attr("w:val"))
        .and_then(|val| atoi_simd::parse::<u32, false, false>(val.as_bytes()).ok())
        .map(|half_points| half_points / 2)
        .unwrap_or(DEFAULT_FONT_SIZE)
}

fn font_name(rpr: &XmlElement, theme: Option<&Theme>) -> String {
    let Some(fonts) = rpr.find("w:rFonts") else {
        return DEFAULT_DISPLAY_FONT.to_string();
    };
    let non_empty = |name: &str| fonts.attr(name).filter(|v| !v.is_empty());

    if let Some(reference) = non_empty("w:eastAsiaTheme") {
        // Unresolvable references are reported verbatim.
        let resolved = theme.and_then(|t| t.font(reference)).unwrap_or(reference);
        return resolved.to_string();
    }
    non_empty("w:ascii")
        .unwrap_or(DEFAULT_DISPLAY_FONT)
        .to_string()
}

fn font_color(rpr: &XmlElement, theme: Option<&Theme>) -> String {
    let Some(color) = rpr.find("w:color") else {
        return resolve_color("", None);
    };

    if let Some(theme_color) = color.attr("w:themeColor")
        && let Some(base) = theme.and_then(|t| t.color(theme_color))
    {
        let transform = ColorTransform {
            tint: color.attr("w:themeTint").and_then(hex_fraction),
            shade: color.attr("w:themeShade").and_then(hex_fraction),
            ..Default::default()
        };
        return resolve_color(&base.to_hex(), Some(&transform));
    }

    resolve_color(color.attr("w:val").unwrap_or_default(), None)
}

/// `themeTint`/`themeShade` are a hex byte over 255.
fn hex_fraction(value: &str) -> Option<f64> {
    u8::from_str_radix(value, 16).ok().map(|v| v as f64 / 255.0)
}

/// A piece of header or footer text with its formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledTextRun {
    pub value: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub size: u32,
    pub font: String,
    pub color: String,
    pub row_flex: RowFlex,
    /// Reserved for border dash patterns; always empty
    pub dash_array: Vec<f64>,
}

impl StyledTextRun {
    pub fn new(value: impl Into<String>, style: RunStyle) -> Self {
        Self {
            value: value.into(),
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
            strikeout: style.strikeout,
            size: style.size,
            font: style.font,
            color: style.color,
            row_flex: RowFlex::Left,
            dash_array: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::fixtures::THEME_XML;

    fn rpr(inner: &str) -> XmlElement {
        let xml = format!(r#"<w:rPr xmlns:w="urn:w">{}</w:rPr>"#, inner);
        XmlElement::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_default_style() {
        let style = RunStyle::from_properties(None, None);
        assert_eq!(style.size, 12);
        assert_eq!(style.font, "微软雅黑");
        assert_eq!(style.color, "#000000");
        assert!(!style.bold);
    }

    #[test]
    fn test_toggles_by_presence() {
        let props = rpr(r#"<w:b w:val="0"/><w:i/><w:u w:val="single"/><w:strike/>"#);
        let style = RunStyle::from_properties(Some(&props), None);
        assert!(style.bold);
        assert!(style.italic);
        assert!(style.underline);
        assert!(style.strikeout);

        let props = rpr(r#"<w:bCs/><w:iCs/>"#);
        let style = RunStyle::from_properties(Some(&props), None);
        assert!(!style.bold);
        assert!(!style.italic);
    }

    #[test]
    fn test_size_rounds_down() {
        let style = RunStyle::from_properties(Some(&rpr(r#"<w:sz w:val="21"/>"#)), None);
        assert_eq!(style.size, 10);
        let style = RunStyle::from_properties(Some(&rpr(r#"<w:sz w:val="big"/>"#)), None);
        assert_eq!(style.size, 12);
    }

    #[test]
    fn test_font_preference() {
        let theme = Theme::from_xml(THEME_XML.as_bytes()).unwrap();
        let props = rpr(r#"<w:rFonts w:ascii="Arial" w:eastAsiaTheme="minorEastAsia"/>"#);

        let style = RunStyle::from_properties(Some(&props), Some(&theme));
        assert_eq!(style.font, "DengXian");

        let style = RunStyle::from_properties(Some(&props), None);
        assert_eq!(style.font, "minorEastAsia");

        let props = rpr(r#"<w:rFonts w:ascii="Arial" w:hAnsi="Arial"/>"#);
        assert_eq!(RunStyle::from_properties(Some(&props), None).font, "Arial");

        let props = rpr(r#"<w:rFonts w:hint="eastAsia"/>"#);
        assert_eq!(RunStyle::from_properties(Some(&props), None).font, "微软雅黑");
    }

    #[test]
    fn test_color() {
        let theme = Theme::from_xml(THEME_XML.as_bytes()).unwrap();

        let props = rpr(r#"<w:color w:val="FF0000"/>"#);
        assert_eq!(RunStyle::from_properties(Some(&props), None).color, "#FF0000");

        let props = rpr(r#"<w:color w:val="auto"/>"#);
        assert_eq!(RunStyle::from_properties(Some(&props), None).color, "#000000");

        let props = rpr(r#"<w:color w:val="4472C4" w:themeColor="accent1"/>"#);
        assert_eq!(RunStyle::from_properties(Some(&props), Some(&theme)).color, "#4472C4");

        let props = rpr(r#"<w:color w:val="1F3864" w:themeColor="accent1" w:themeShade="80"/>"#);
        assert_eq!(RunStyle::from_properties(Some(&props), Some(&theme)).color, "#223962");
        assert_eq!(RunStyle::from_properties(Some(&props), None).color, "#1F3864");
    }

    #[test]
    fn test_serialized_shape() {
        let run = StyledTextRun::new("Page", RunStyle::default());
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["value"], "Page");
        assert_eq!(json["rowFlex"], "left");
        assert_eq!(json["dashArray"], serde_json::json!([]));
        assert_eq!(json["size"], 12);
    }
}
