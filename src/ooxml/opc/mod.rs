/// Open Packaging Conventions (OPC) reading support.
///
/// This module provides the subset of the OPC specification needed to read
/// Office Open XML documents:
///
/// - Package access (zip members decompressed once, read by member name)
/// - Pack URIs and relative reference resolution
/// - Relationship manifests (`.rels` parts)
///
/// # Performance Features
///
/// - Uses `quick-xml` for efficient streaming XML parsing
/// - Uses hash maps for O(1) part and relationship lookups

pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod rel;

// Re-export commonly used types
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
