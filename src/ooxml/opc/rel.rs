use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
/// Relationship-related objects for OPC packages.
///
/// This module provides types for reading the relationship manifests (`.rels`
/// parts) of a package and resolving relationship ids to package members.
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// A single relationship from a source part to a target.
///
/// Represents a connection between parts in an OPC package, identified by an rId
/// (relationship ID). Can be either internal (pointing to another part) or external
/// (pointing to an external URL).
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part URI or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference exactly as written in the manifest.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "Relationship '{}' targets an external resource",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source part.
///
/// Lookup by relationship ID is O(1); iteration follows manifest order.
#[derive(Debug, Default)]
pub struct Relationships {
    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,

    /// Relationship IDs in manifest order
    order: Vec<String>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` manifest.
    ///
    /// # Arguments
    /// * `base_uri` - Base URI of the source part, used to resolve relative targets
    /// * `rels_xml` - Raw bytes of the manifest
    pub fn from_xml(base_uri: &str, rels_xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = String::new();
                        let mut target_ref = None;
                        let mut is_external = false;

                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                                b"Type" => reltype = attr.unescape_value()?.to_string(),
                                b"Target" => {
                                    target_ref = Some(attr.unescape_value()?.to_string())
                                },
                                b"TargetMode" => {
                                    is_external =
                                        attr.unescape_value()?.as_ref() == target_mode::EXTERNAL
                                },
                                _ => {},
                            }
                        }

                        if let (Some(r_id), Some(target_ref)) = (r_id, target_ref) {
                            rels.add_relationship(
                                reltype,
                                target_ref,
                                r_id,
                                base_uri.to_string(),
                                is_external,
                            );
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Relationships parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Add a relationship to the collection.
    ///
    /// A later entry with the same ID replaces the earlier one.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        base_uri: String,
        is_external: bool,
    ) {
        let rel = Relationship::new(r_id.clone(), reltype, target_ref, base_uri, is_external);
        if self.rels.insert(r_id.clone(), rel).is_none() {
            self.order.push(r_id);
        }
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Resolve a relationship ID to the zip member name of its target.
    pub fn target_membername(&self, r_id: &str) -> Result<String> {
        let rel = self
            .get(r_id)
            .ok_or_else(|| OpcError::RelationshipNotFound(r_id.to_string()))?;
        Ok(rel.target_partname()?.membername().to_string())
    }

    /// Get the first relationship of a specific type, in manifest order.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        self.iter()
            .find(|rel| rel.reltype() == reltype)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound(format!("No relationship of type '{}'", reltype))
            })
    }

    /// Get an iterator over all relationships in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.order.iter().filter_map(|r_id| self.rels.get(r_id))
    }

    /// Get the number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}
