/// Parse context - the state handed from stage to stage.
use crate::common::error::Result;
use crate::ooxml::docx::Document;
use crate::ooxml::opc::OpcPackage;
use crate::pipeline::options::ParseOptions;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Plain data tree produced by a parse. Later stages may overwrite keys.
pub type Content = Map<String, Value>;

/// Capability key of the [`Units`](crate::common::Units) used for length conversion.
pub const UNITS_CAPABILITY: &str = "units";

/// Capability key of the document [`Theme`](crate::ooxml::docx::Theme).
pub const THEME_CAPABILITY: &str = "theme";

/// Named, typed values shared between stages.
///
/// Values are stored type-erased and handed back by downcast, so a stage
/// asking for the wrong type simply gets `None`.
#[derive(Clone, Default)]
pub struct Capabilities {
    entries: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a capability, replacing any earlier value under the same key.
    pub fn provide<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: Arc<T>) {
        self.entries.insert(key.into(), value);
    }

    /// Look up a capability by key.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let entry = self.entries.get(key)?;
        match Arc::clone(entry).downcast::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!(
                    "Capability '{}' is not a {}",
                    key,
                    std::any::type_name::<T>()
                );
                None
            },
        }
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys of all provided capabilities, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("keys", &self.keys())
            .finish()
    }
}

/// Everything a stage can see during a parse.
///
/// A stage receives the context by value and returns the context the next
/// stage should see. The document, archive and options are shared handles,
/// so cloning a context only copies the content tree and the capability map.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub document: Arc<Document>,
    pub archive: Arc<OpcPackage>,
    pub content: Content,
    pub capabilities: Capabilities,
    pub options: Arc<ParseOptions>,
}

impl ParseContext {
    /// Context with empty content and no capabilities.
    pub fn new(document: Arc<Document>, archive: Arc<OpcPackage>, options: Arc<ParseOptions>) -> Self {
        Self {
            document,
            archive,
            content: Content::new(),
            capabilities: Capabilities::new(),
            options,
        }
    }

    /// Serialize `value` into the content tree under `key`.
    pub fn insert_content<T: Serialize>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.content.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }
}
