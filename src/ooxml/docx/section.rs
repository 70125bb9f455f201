/// Section - page geometry and header/footer references of a document.
use crate::common::error::{Error, Result};
use crate::common::unit::{Units, parse_measure};
use crate::common::xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

/// Page margins in pixels.
///
/// Word allows negative top and bottom margins (text may overlap the header),
/// so margins are signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageMargin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
    /// Header distance from top edge
    pub header: i32,
    /// Footer distance from bottom edge
    pub footer: i32,
}

/// Reading direction of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperDirection {
    #[default]
    Vertical,
    Horizontal,
}

impl fmt::Display for PaperDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => write!(f, "vertical"),
            Self::Horizontal => write!(f, "horizontal"),
        }
    }
}

/// Page properties of the first section of a document.
///
/// `size` is always reported in portrait form: for landscape pages the
/// declared width and height are swapped so that `size.width` is the shorter
/// edge, and `paper_direction` records the intended orientation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProperties {
    pub size: PageSize,
    pub margin: PageMargin,
    pub paper_direction: PaperDirection,
    /// `r:id` of every `w:headerReference`, in document order
    pub header_relationship_ids: Vec<String>,
    /// `r:id` of every `w:footerReference`, in document order
    pub footer_relationship_ids: Vec<String>,
}

/// Parse page size, margins and header/footer references from the main
/// document markup.
///
/// The first `w:pgSz` and `w:pgMar` in the document are used. A missing
/// attribute counts as zero; a malformed one fails with
/// [`Error::InvalidLength`].
pub fn parse_section_properties(units: &Units, document: &XmlElement) -> Result<PageProperties> {
    let pg_sz = document
        .find("w:pgSz")
        .ok_or_else(|| Error::InvalidFormat("Document has no w:pgSz element".to_string()))?;
    let pg_mar = document
        .find("w:pgMar")
        .ok_or_else(|| Error::InvalidFormat("Document has no w:pgMar element".to_string()))?;

    let px = |element: &XmlElement, name: &str| -> Result<f64> {
        match element.attr(name) {
            Some(value) => Ok(units.dxa_to_px(parse_measure(value)?).ceil()),
            None => Ok(0.0),
        }
    };

    let width = px(pg_sz, "w:w")?.max(0.0) as u32;
    let height = px(pg_sz, "w:h")?.max(0.0) as u32;
    let (paper_direction, size) = if width > height {
        (
            PaperDirection::Horizontal,
            PageSize {
                width: height,
                height: width,
            },
        )
    } else {
        (PaperDirection::Vertical, PageSize { width, height })
    };

    let margin = PageMargin {
        top: px(pg_mar, "w:top")? as i32,
        right: px(pg_mar, "w:right")? as i32,
        bottom: px(pg_mar, "w:bottom")? as i32,
        left: px(pg_mar, "w:left")? as i32,
        header: px(pg_mar, "w:header")? as i32,
        footer: px(pg_mar, "w:footer")? as i32,
    };

    Ok(PageProperties {
        size,
        margin,
        paper_direction,
        header_relationship_ids: reference_ids(document, "w:headerReference"),
        footer_relationship_ids: reference_ids(document, "w:footerReference"),
    })
}

fn reference_ids(document: &XmlElement, name: &str) -> Vec<String> {
    document
        .find_all(name)
        .filter_map(|reference| reference.attr("r:id"))
        .map(str::to_string)
        .collect()
}
