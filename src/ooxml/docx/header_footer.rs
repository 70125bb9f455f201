/// Header and footer text extraction.
///
/// Headers and footers are separate parts referenced from the section
/// properties by relationship id. Each is reduced to a flat list of styled
/// runs; text inside drawing fallbacks (`mc:AlternateContent`) is dropped.
use crate::common::error::{Error, Result};
use crate::common::xml::XmlElement;
use crate::ooxml::docx::run::{RunStyle, StyledTextRun};
use crate::ooxml::docx::theme::Theme;
use crate::ooxml::opc::packuri::MAIN_DOCUMENT_URI;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::pipeline::context::{Capabilities, THEME_CAPABILITY};

/// Resolve a relationship id of the main document to a package member name.
///
/// `../x` resolves against the parent of `word/`, `x` to `word/x`, and `/x` to `x`.
pub fn resolve_relationship_target(archive: &OpcPackage, id: &str) -> Result<String> {
    let source = PackURI::new(MAIN_DOCUMENT_URI).map_err(Error::InvalidFormat)?;
    resolve_relationship_target_from(archive, &source, id)
}

/// Resolve a relationship id declared by any source part.
pub fn resolve_relationship_target_from(
    archive: &OpcPackage,
    source: &PackURI,
    id: &str,
) -> Result<String> {
    let rels = archive.part_rels(source)?;
    Ok(rels.target_membername(id)?)
}

/// Extract the runs of every referenced header or footer part, one list per
/// id in input order.
///
/// `source` is the part declaring the ids, normally the main document. The
/// `theme` capability, when present, resolves theme font and color
/// references.
pub fn parse_header_footer_runs(
    archive: &OpcPackage,
    source: &PackURI,
    capabilities: &Capabilities,
    ids: &[String],
) -> Result<Vec<Vec<StyledTextRun>>> {
    let theme = capabilities.get::<Theme>(THEME_CAPABILITY);
    let theme = theme.as_deref();

    ids.iter()
        .map(|id| {
            let member = resolve_relationship_target_from(archive, source, id)?;
            let markup = XmlElement::parse(archive.read_part(&member)?.as_bytes())?;
            Ok(parse_runs(&markup, theme))
        })
        .collect()
}

/// Runs of the top-level paragraphs of a header or footer part.
pub fn parse_runs(part: &XmlElement, theme: Option<&Theme>) -> Vec<StyledTextRun> {
    let mut runs = Vec::new();

    for paragraph in part.top_level("w:p") {
        if paragraph.contains("mc:AlternateContent") {
            let cleaned = paragraph.without("mc:AlternateContent");
            let text = cleaned.text_of("w:t");
            let text = text.trim();
            if !text.is_empty() {
                let style = RunStyle::from_properties(cleaned.find("w:rPr"), theme);
                runs.push(StyledTextRun::new(text, style));
            }
            continue;
        }

        for run in paragraph.find_all("w:r") {
            let text = run.text_of("w:t");
            if text.is_empty() {
                continue;
            }
            let style = RunStyle::from_properties(run.find("w:rPr"), theme);
            runs.push(StyledTextRun::new(text, style));
        }
    }

    runs
}
