/// Page stage - page geometry and header/footer runs.
use crate::common::error::Result;
use crate::common::unit::Units;
use crate::ooxml::docx::fonts::font_mapper;
use crate::ooxml::docx::{parse_header_footer_runs, parse_section_properties};
use crate::pipeline::context::{ParseContext, UNITS_CAPABILITY};
use crate::pipeline::stage::Stage;
use serde_json::Value;

/// Writes `page` (size, margins, orientation, header/footer ids),
/// `headers` and `footers` (one run list per referenced part) and
/// `fontMapper`.
///
/// Lengths use the `units` capability, or 96 DPI when no earlier stage
/// provided one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageStage;

impl Stage for PageStage {
    fn name(&self) -> &str {
        "page"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn process(&self, mut ctx: ParseContext) -> Result<ParseContext> {
        let units = ctx
            .capabilities
            .get::<Units>(UNITS_CAPABILITY)
            .map(|units| *units)
            .unwrap_or_default();

        let page = parse_section_properties(&units, ctx.document.markup()?)?;
        let source = ctx.document.partname();
        let headers = parse_header_footer_runs(
            &ctx.archive,
            source,
            &ctx.capabilities,
            &page.header_relationship_ids,
        )?;
        let footers = parse_header_footer_runs(
            &ctx.archive,
            source,
            &ctx.capabilities,
            &page.footer_relationship_ids,
        )?;

        ctx.insert_content("page", &page)?;
        ctx.insert_content("headers", &headers)?;
        ctx.insert_content("footers", &footers)?;
        ctx.content
            .insert("fontMapper".to_string(), Value::Object(font_mapper()));
        Ok(ctx)
    }
}
