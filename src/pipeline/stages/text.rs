/// Text stage - generic plain-text extraction.
use crate::common::error::Result;
use crate::pipeline::context::ParseContext;
use crate::pipeline::stage::Stage;
use serde_json::Value;

/// Writes the document text, one line per paragraph, under `text`.
///
/// Runs last so layout stages can still replace it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStage;

impl Stage for TextStage {
    fn name(&self) -> &str {
        "default"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn process(&self, mut ctx: ParseContext) -> Result<ParseContext> {
        let text = ctx.document.text()?;
        ctx.content.insert("text".to_string(), Value::String(text));
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::docx::Document;
    use crate::ooxml::fixtures::DocxBuilder;
    use crate::ooxml::opc::OpcPackage;
    use crate::pipeline::options::ParseOptions;
    use std::sync::Arc;

    #[test]
    fn test_writes_text() {
        let package = OpcPackage::from_bytes(&DocxBuilder::new().build()).unwrap();
        let document = Document::from_package(&package).unwrap();
        let ctx = ParseContext::new(
            Arc::new(document),
            Arc::new(package),
            Arc::new(ParseOptions::default()),
        );

        let ctx = TextStage.process(ctx).unwrap();
        assert_eq!(ctx.content["text"], "Hello\nWorld");
    }
}
