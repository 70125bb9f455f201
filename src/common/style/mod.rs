//! Color handling shared by the run decoder and the theme reader.

// Submodule declarations
pub mod color;

// Re-exports
pub use color::{ColorTransform, RGBColor, resolve_color};
