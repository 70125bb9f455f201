/// Base stage - shared helpers for the stages that follow.
use crate::common::error::Result;
use crate::common::unit::Units;
use crate::ooxml::docx::Theme;
use crate::pipeline::context::{ParseContext, THEME_CAPABILITY, UNITS_CAPABILITY};
use crate::pipeline::stage::Stage;
use std::sync::Arc;

/// Provides the `units` capability for the configured DPI and, when the
/// document has one, the `theme` capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseStage;

impl Stage for BaseStage {
    fn name(&self) -> &str {
        "base"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn process(&self, mut ctx: ParseContext) -> Result<ParseContext> {
        ctx.capabilities
            .provide(UNITS_CAPABILITY, Arc::new(Units::new(ctx.options.dpi)));

        if let Some(theme) = Theme::load(&ctx.archive)? {
            ctx.capabilities.provide(THEME_CAPABILITY, Arc::new(theme));
        }
        Ok(ctx)
    }
}
