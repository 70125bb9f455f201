//! Litchi Layout - page geometry and header/footer extraction for Word documents
//!
//! This library reads Office Open XML word-processing packages (.docx) and
//! turns them into a plain data tree that renderers can lay pages out from.
//!
//! # Features
//!
//! - **Stage pipeline**: an ordered, fault-isolated chain of stages over a
//!   shared parse context, with an event bus for lifecycle notifications
//! - **Page geometry**: page size, margins and orientation in pixels
//! - **Headers and footers**: styled text runs with theme fonts and colors
//!   resolved
//! - **Unit and color math**: EMU, twip, point and metric conversions, Word
//!   color names and theme tint/shade transforms
//! - **Host-controlled loading**: stages discovered from YAML manifests
//!   resolved through a factory table the host owns
//!
//! # Example - Parsing a DOCX file
//!
//! ```no_run
//! use litchi_layout::ParseOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("document.docx")?;
//! let content = litchi_layout::parse(&data, &ParseOptions::default())?;
//!
//! println!("Paper: {}", content["page"]["paperDirection"]);
//! println!("Width: {}px", content["page"]["size"]["width"]);
//! for header in content["headers"].as_array().into_iter().flatten() {
//!     println!("Header: {}", header);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Custom stages
//!
//! ```no_run
//! use litchi_layout::pipeline::{EventType, Extractor, StageSpec};
//! use litchi_layout::ParseOptions;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = Extractor::with_default_stages()?;
//! extractor.bus().subscribe(EventType::StageProcessError, |event| {
//!     eprintln!("{:?}", event.payload);
//! });
//! extractor.registry().register(
//!     StageSpec::named("word-count", |mut ctx| {
//!         let words = ctx.document.text()?.split_whitespace().count();
//!         ctx.content.insert("words".into(), words.into());
//!         Ok(ctx)
//!     })
//!     .priority(120),
//! )?;
//!
//! let content = extractor.parse(&std::fs::read("document.docx")?, &ParseOptions::default())?;
//! println!("{} words", content["words"]);
//! # Ok(())
//! # }
//! ```

/// Common types and utilities
pub mod common;

/// OOXML package access and WordprocessingML decoding
pub mod ooxml;

/// Stage pipeline
pub mod pipeline;

pub use common::{Error, Result};
pub use pipeline::{Content, Extractor, ParseOptions};

/// Parse a `.docx` package with the built-in stages.
///
/// Builds a fresh [`Extractor`] for this call; use an extractor directly to
/// keep registered stages, subscriptions and discovery results across parses.
pub fn parse(data: &[u8], options: &ParseOptions) -> Result<Content> {
    Extractor::with_default_stages()?.parse(data, options)
}
