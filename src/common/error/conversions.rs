//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::ooxml::opc::error::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        match err {
            OpcError::CorruptArchive(s) => Error::CorruptArchive(s),
            OpcError::PartNotFound(s) => Error::PartNotFound(s),
            OpcError::RelationshipNotFound(s) => Error::RelationshipNotFound(s),
            OpcError::XmlError(s) => Error::XmlError(s),
            OpcError::IoError(e) => Error::Io(e),
            OpcError::QuickXmlError(e) => Error::XmlError(e.to_string()),
            OpcError::AttrError(s) => Error::XmlError(s),
            OpcError::Utf8Error(e) => Error::InvalidFormat(e.to_string()),
            other => Error::InvalidFormat(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::InvalidFormat(format!("Invalid UTF-8: {}", err))
    }
}
