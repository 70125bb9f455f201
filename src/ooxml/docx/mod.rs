//! WordprocessingML (.docx) decoding.
//!
//! Only what page layout extraction needs is decoded: the main document,
//! the first section's page geometry, header/footer runs, and the theme
//! fonts and colors those runs refer to.
//!
//! # Example
//!
//! ```rust,no_run
//! use litchi_layout::common::Units;
//! use litchi_layout::ooxml::docx::{Document, section::parse_section_properties};
//!
//! let doc = Document::load(&std::fs::read("document.docx")?)?;
//! let page = parse_section_properties(&Units::default(), doc.markup()?)?;
//! println!("{}x{} px, {}", page.size.width, page.size.height, page.paper_direction);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod fonts;
pub mod header_footer;
pub mod run;
pub mod section;
pub mod theme;

pub use document::Document;
pub use header_footer::{
    parse_header_footer_runs, resolve_relationship_target, resolve_relationship_target_from,
};
pub use run::{RowFlex, RunStyle, StyledTextRun};
pub use section::{PageMargin, PageProperties, PageSize, PaperDirection, parse_section_properties};
pub use theme::Theme;
