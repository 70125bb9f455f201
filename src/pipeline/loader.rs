//! Host-controlled stage loading.
//!
//! Discovery never executes files from disk. A stage directory holds a
//! small YAML manifest naming a factory key; the host decides, through a
//! [`StageLoader`], which code that key stands for.
//!
//! ```yaml
//! # stages/watermark/stage.yaml
//! factory: watermark
//! name: watermark-v2
//! priority: 50
//! enabled: true
//! meta:
//!   author: layout team
//! ```

use crate::common::error::{Error, Result};
use crate::pipeline::stage::StageSpec;
use crate::pipeline::stages::{BaseStage, PageStage, TextStage};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// File names recognised as a stage manifest, in order of preference.
pub const MANIFEST_FILES: [&str; 2] = ["stage.yaml", "stage.yml"];

/// Zero-argument constructor of a stage descriptor.
pub type StageFactory = Arc<dyn Fn() -> StageSpec + Send + Sync>;

/// What a loader hands back for a manifest.
#[derive(Clone)]
pub enum StageModule {
    /// Called once to produce the descriptor
    Factory(StageFactory),
    /// Ready-made descriptor
    Descriptor(StageSpec),
}

impl StageModule {
    /// Produce the descriptor to register.
    pub fn into_spec(self) -> StageSpec {
        match self {
            StageModule::Factory(factory) => factory(),
            StageModule::Descriptor(spec) => spec,
        }
    }
}

impl fmt::Debug for StageModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageModule::Factory(_) => f.write_str("StageModule::Factory"),
            StageModule::Descriptor(spec) => f.debug_tuple("StageModule::Descriptor").field(spec).finish(),
        }
    }
}

/// Resolves a manifest file to stage code.
pub trait StageLoader: Send + Sync {
    fn load(&self, manifest: &Path) -> Result<StageModule>;
}

/// Contents of a `stage.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageManifest {
    /// Key looked up in the loader's factory table
    pub factory: String,
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl StageManifest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|e| Error::InvalidManifest(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        serde_saphyr::from_str(&yaml)
            .map_err(|e| Error::InvalidManifest(format!("{}: {}", path.display(), e)))
    }

    /// Apply the manifest's overrides to a descriptor.
    pub fn apply(&self, mut spec: StageSpec) -> StageSpec {
        if let Some(name) = &self.name {
            spec = spec.name(name.clone());
        }
        if let Some(priority) = self.priority {
            spec = spec.priority(priority);
        }
        if let Some(enabled) = self.enabled {
            spec = spec.enabled(enabled);
        }
        for (key, value) in &self.meta {
            spec = spec.meta(key.clone(), value.clone());
        }
        spec
    }
}

/// Loader backed by an in-process table of factory keys.
#[derive(Default)]
pub struct FactoryTable {
    entries: HashMap<String, StageModule>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in stages under `base`, `page` and `text`.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register_factory("base", || BaseStage.into());
        table.register_factory("page", || PageStage.into());
        table.register_factory("text", || TextStage.into());
        table
    }

    pub fn register_factory<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> StageSpec + Send + Sync + 'static,
    {
        self.entries.insert(key.into(), StageModule::Factory(Arc::new(factory)));
    }

    pub fn register_descriptor(&mut self, key: impl Into<String>, spec: StageSpec) {
        self.entries.insert(key.into(), StageModule::Descriptor(spec));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Factory keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl StageLoader for FactoryTable {
    fn load(&self, manifest_path: &Path) -> Result<StageModule> {
        let manifest = StageManifest::from_file(manifest_path)?;
        let module = self.entries.get(&manifest.factory).ok_or_else(|| {
            Error::InvalidManifest(format!(
                "{}: unknown factory '{}'",
                manifest_path.display(),
                manifest.factory
            ))
        })?;

        Ok(match module {
            StageModule::Factory(factory) => {
                let factory = Arc::clone(factory);
                StageModule::Factory(Arc::new(move || manifest.apply(factory())))
            },
            StageModule::Descriptor(spec) => StageModule::Descriptor(manifest.apply(spec.clone())),
        })
    }
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryTable")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_manifest(dir: &Path, yaml: &str) -> std::path::PathBuf {
        let path = dir.join("stage.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_manifest_parse() {
        let manifest = StageManifest::from_yaml_str(
            "factory: page\nname: layout\npriority: 0\nenabled: false\nmeta:\n  version: 2\n",
        )
        .unwrap();
        assert_eq!(manifest.factory, "page");
        assert_eq!(manifest.name.as_deref(), Some("layout"));
        assert_eq!(manifest.priority, Some(0));
        assert_eq!(manifest.enabled, Some(false));
        assert_eq!(manifest.meta["version"], 2);

        assert!(matches!(
            StageManifest::from_yaml_str("name: no-factory\n"),
            Err(Error::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_builtins_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "factory: page\nname: geometry\npriority: 0\n");

        let table = FactoryTable::with_builtins();
        assert_eq!(table.keys(), vec!["base", "page", "text"]);

        let module = table.load(&path).unwrap();
        assert!(matches!(module, StageModule::Factory(_)));
        let spec = module.into_spec();
        assert_eq!(spec.get_name(), Some("geometry"));
        assert_eq!(spec.priority, Some(0));
        assert!(spec.process.is_some());
    }

    #[test]
    fn test_descriptor_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "factory: noop\nenabled: false\n");

        let mut table = FactoryTable::new();
        table.register_descriptor("noop", StageSpec::named("noop", Ok).priority(7));

        let spec = table.load(&path).unwrap().into_spec();
        assert_eq!(spec.get_name(), Some("noop"));
        assert_eq!(spec.priority, Some(7));
        assert_eq!(spec.enabled, Some(false));
    }

    #[test]
    fn test_unknown_factory() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_manifest(dir.path(), "factory: missing\n");
        let err = FactoryTable::with_builtins().load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(m) if m.contains("missing")));
    }
}
