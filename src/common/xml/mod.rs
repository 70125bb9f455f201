//! XML helpers shared by the package and document readers.

pub mod escape;
pub mod tree;

pub use escape::unescape_xml;
pub use tree::{XmlElement, XmlNode};
