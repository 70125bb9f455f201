/// Provides the PackURI value type and utilities for working with package URIs.
///
/// A PackURI represents a part name within an OPC package, following the URI format
/// defined by the Open Packaging Conventions specification. Zip member names are
/// the same path with the leading slash stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackURI {
    /// The full pack URI string (e.g., "/word/document.xml")
    uri: String,
}

impl PackURI {
    /// Create a new PackURI from a string.
    ///
    /// # Arguments
    /// * `uri` - The URI string, which must begin with a forward slash
    ///
    /// # Returns
    /// * `Ok(PackURI)` if the URI is valid
    /// * `Err` if the URI doesn't start with a forward slash
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Create a PackURI from a zip member name such as `word/document.xml`.
    pub fn from_membername(membername: &str) -> Self {
        PackURI {
            uri: format!("/{}", membername.trim_start_matches('/')),
        }
    }

    /// Create a PackURI from a relative reference and a base URI.
    ///
    /// This translates a relative reference (like "../media/image1.png") onto a base URI
    /// (like "/word") to produce an absolute PackURI (like "/media/image1.png").
    /// References that are already absolute are only normalized.
    ///
    /// # Arguments
    /// * `base_uri` - The base URI to resolve from
    /// * `relative_ref` - The relative reference to resolve
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.is_empty() {
            return Err("Empty relationship target".to_string());
        }

        let joined = if relative_ref.starts_with('/') {
            relative_ref.to_string()
        } else {
            Self::join_paths(base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Get the base URI (directory portion) of this PackURI.
    ///
    /// For example, "/word" for "/word/document.xml".
    /// For the package pseudo-partname "/", returns "/".
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Get the filename portion of this PackURI.
    ///
    /// For example, "document.xml" for "/word/document.xml".
    /// For the package pseudo-partname "/", returns an empty string.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// Get the membername (URI with leading slash stripped).
    ///
    /// This is the form used as the Zip file membername for the package item.
    /// Returns an empty string for the package pseudo-partname "/".
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Get the PackURI of the .rels part corresponding to this PackURI.
    ///
    /// For example, "/word/_rels/document.xml.rels" for "/word/document.xml",
    /// and "/_rels/.rels" for the package itself.
    pub fn rels_uri(&self) -> PackURI {
        let filename = self.filename();
        let base_uri = self.base_uri();

        let uri = if base_uri == "/" {
            format!("/_rels/{}.rels", filename)
        } else {
            format!("{}/_rels/{}.rels", base_uri, filename)
        };
        PackURI { uri }
    }

    /// Get the full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Helper function to join two paths using forward slashes
    fn join_paths(base: &str, rel: &str) -> String {
        if base.ends_with('/') {
            format!("{}{}", base, rel)
        } else {
            format!("{}/{}", base, rel)
        }
    }

    /// Helper function to normalize a path (resolve ".." and ".")
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        format!("/{}", parts.join("/"))
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The package pseudo-partname, representing the package itself
pub const PACKAGE_URI: &str = "/";

/// Conventional partname of the main WordprocessingML document
pub const MAIN_DOCUMENT_URI: &str = "/word/document.xml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/word/document.xml").is_ok());
        assert!(PackURI::new("word/document.xml").is_err());
    }

    #[test]
    fn test_base_uri_and_filename() {
        let uri = PackURI::new("/word/header1.xml").unwrap();
        assert_eq!(uri.base_uri(), "/word");
        assert_eq!(uri.filename(), "header1.xml");

        let root = PackURI::new("/").unwrap();
        assert_eq!(root.base_uri(), "/");
        assert_eq!(root.filename(), "");
        assert_eq!(root.membername(), "");
    }

    #[test]
    fn test_from_rel_ref() {
        let parent = PackURI::from_rel_ref("/word", "../media/image1.png").unwrap();
        assert_eq!(parent.membername(), "media/image1.png");

        let sibling = PackURI::from_rel_ref("/word", "header1.xml").unwrap();
        assert_eq!(sibling.membername(), "word/header1.xml");

        let dotted = PackURI::from_rel_ref("/word", "./theme/theme1.xml").unwrap();
        assert_eq!(dotted.membername(), "word/theme/theme1.xml");

        let absolute = PackURI::from_rel_ref("/word", "/customXml/item1.xml").unwrap();
        assert_eq!(absolute.membername(), "customXml/item1.xml");

        assert!(PackURI::from_rel_ref("/word", "").is_err());
    }

    #[test]
    fn test_rels_uri() {
        let doc = PackURI::new(MAIN_DOCUMENT_URI).unwrap();
        assert_eq!(doc.rels_uri().membername(), "word/_rels/document.xml.rels");

        let pkg = PackURI::new(PACKAGE_URI).unwrap();
        assert_eq!(pkg.rels_uri().membername(), "_rels/.rels");
    }

    #[test]
    fn test_from_membername() {
        assert_eq!(PackURI::from_membername("word/footer2.xml").as_str(), "/word/footer2.xml");
        assert_eq!(PackURI::from_membername("/word/footer2.xml").as_str(), "/word/footer2.xml");
    }
}
