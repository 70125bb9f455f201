/// In-memory, read-only view of an OPC package.
///
/// This module provides the main OpcPackage type. The archive is decompressed
/// eagerly when opened so that part reads, relationship lookups and stage
/// execution never touch the underlying container again.
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{MAIN_DOCUMENT_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::rel::Relationships;

/// UTF-8 byte order mark, tolerated at the start of XML parts.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Upper bound on the buffer reserved up front for a member; the declared
/// size is only a hint.
const MAX_RESERVE: u64 = 1 << 20;

/// Main API type for reading OPC packages.
///
/// Parts are keyed by zip member name (no leading slash). The package is
/// immutable once opened and can be shared freely between threads.
#[derive(Debug, Default)]
pub struct OpcPackage {
    /// Decompressed part contents, indexed by member name
    parts: HashMap<String, Vec<u8>>,

    /// Member names in archive order
    order: Vec<String>,
}

impl OpcPackage {
    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use litchi_layout::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("document.docx").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Load an OPC package from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Load an OPC package from a reader.
    ///
    /// Fails with [`OpcError::CorruptArchive`] when the container cannot be read.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut parts = HashMap::with_capacity(archive.len());
        let mut order = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let declared = file.size();
            if declared > isize::MAX as u64 {
                return Err(OpcError::CorruptArchive(format!(
                    "{}: declared size {} is out of range",
                    name, declared
                )));
            }
            let mut blob = Vec::with_capacity(declared.min(MAX_RESERVE) as usize);
            file.read_to_end(&mut blob)
                .map_err(|e| OpcError::CorruptArchive(format!("{}: {}", name, e)))?;

            if parts.insert(name.clone(), blob).is_none() {
                order.push(name);
            }
        }

        Ok(Self { parts, order })
    }

    /// Get the raw bytes of a part.
    pub fn blob(&self, membername: &str) -> Result<&[u8]> {
        self.parts
            .get(membername.trim_start_matches('/'))
            .map(Vec::as_slice)
            .ok_or_else(|| OpcError::PartNotFound(membername.to_string()))
    }

    /// Read a part as text.
    ///
    /// A leading byte order mark is dropped. Fails with [`OpcError::PartNotFound`]
    /// if the member does not exist.
    pub fn read_part(&self, membername: &str) -> Result<String> {
        let blob = self.blob(membername)?;
        let blob = blob.strip_prefix(UTF8_BOM).unwrap_or(blob);
        Ok(std::str::from_utf8(blob)?.to_string())
    }

    /// Check if a part exists in the package.
    pub fn contains(&self, membername: &str) -> bool {
        self.parts.contains_key(membername.trim_start_matches('/'))
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Get the number of parts in the package.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Check if the package has no parts.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Load the relationships whose source is the given part.
    ///
    /// A part without a `.rels` manifest has no relationships.
    pub fn part_rels(&self, source: &PackURI) -> Result<Relationships> {
        let rels_uri = source.rels_uri();
        match self.parts.get(rels_uri.membername()) {
            Some(xml) => Relationships::from_xml(source.base_uri(), xml),
            None => Ok(Relationships::new()),
        }
    }

    /// Load the package-level relationships (`_rels/.rels`).
    pub fn package_rels(&self) -> Result<Relationships> {
        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        self.part_rels(&package_uri)
    }

    /// Get the partname of the main document.
    ///
    /// Follows the package officeDocument relationship, falling back to the
    /// conventional `/word/document.xml` when the package declares none.
    pub fn main_document_partname(&self) -> Result<PackURI> {
        let rels = self.package_rels()?;
        match rels.part_with_reltype(relationship_type::OFFICE_DOCUMENT) {
            Ok(rel) => rel.target_partname(),
            Err(_) => PackURI::new(MAIN_DOCUMENT_URI).map_err(OpcError::InvalidPackUri),
        }
    }
}
