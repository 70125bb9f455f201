//! Common types and utilities shared by the package reader, the document
//! decoder and the extraction pipeline.

// Submodule declarations
pub mod error;
pub mod style;
pub mod unit;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
pub use style::{ColorTransform, RGBColor, resolve_color};
pub use unit::{Length, LengthUnit, Units};
