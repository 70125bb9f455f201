//! Office Open XML (OOXML) reading.
//!
//! The module is organized in two layers:
//!
//! 1. **OPC Layer** (`opc`): package access (ZIP members, pack URIs, relationships)
//! 2. **WordprocessingML** (`docx`): main document, sections, header/footer runs, theme

pub mod docx;
pub mod opc;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};
