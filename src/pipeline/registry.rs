//! Stage registry.
//!
//! Holds the registered stages ordered by ascending priority. Stages with
//! equal priority keep their registration order. Every change is announced
//! on the event bus.

use crate::common::error::{Error, Result};
use crate::pipeline::events::{EventBus, EventPayload, EventType, panic_message};
use crate::pipeline::loader::{FactoryTable, MANIFEST_FILES, StageLoader};
use crate::pipeline::stage::{RegisteredStage, StageInfo, StageSpec};
use chrono::Utc;
use parking_lot::RwLock;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Ordered collection of pipeline stages.
///
/// The registry is shared between the extractor and any host code that
/// manages stages; all methods take `&self`.
pub struct StageRegistry {
    bus: Arc<EventBus>,
    stages: RwLock<Vec<Arc<RegisteredStage>>>,
    loader: RwLock<Arc<dyn StageLoader>>,
    discovered: AtomicBool,
    seq: AtomicU64,
}

impl StageRegistry {
    /// Empty registry resolving manifests through [`FactoryTable::with_builtins`].
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_loader(bus, Arc::new(FactoryTable::with_builtins()))
    }

    pub fn with_loader(bus: Arc<EventBus>, loader: Arc<dyn StageLoader>) -> Self {
        Self {
            bus,
            stages: RwLock::new(Vec::new()),
            loader: RwLock::new(loader),
            discovered: AtomicBool::new(false),
            seq: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Replace the loader used by discovery and explicit loading.
    pub fn set_loader(&self, loader: Arc<dyn StageLoader>) {
        *self.loader.write() = loader;
    }

    /// Register a stage.
    ///
    /// Fails with [`Error::InvalidStage`] when the descriptor has no process
    /// function. A failing `on_init` is logged and does not prevent
    /// registration.
    pub fn register(&self, spec: impl Into<StageSpec>) -> Result<StageInfo> {
        let mut spec = spec.into();
        let process = spec.process.take().ok_or_else(|| {
            Error::InvalidStage(format!(
                "stage '{}' has no process function",
                spec.get_name().unwrap_or("<unnamed>")
            ))
        })?;

        let name = match spec.name.take() {
            Some(name) => name,
            None => format!("stage_{}", self.stages.read().len()),
        };
        let id = format!(
            "stage_{}_{}",
            Utc::now().timestamp_millis(),
            self.seq.fetch_add(1, Ordering::Relaxed)
        );
        let handlers = std::mem::take(&mut spec.subscribe);
        let stage = Arc::new(RegisteredStage::new(id, name, process, spec));

        stage.init();
        stage.subscribe_all(&self.bus, handlers);

        {
            let mut stages = self.stages.write();
            stages.push(Arc::clone(&stage));
            stages.sort_by_key(|s| s.priority());
        }

        let info = stage.info();
        log::debug!("Registered stage '{}' ({}) at priority {}", info.name, info.id, info.priority);
        self.bus.publish(EventType::StageRegistered, EventPayload::Stage(info.clone()));
        Ok(info)
    }

    /// Remove a stage by id or name.
    ///
    /// An id match wins over a name match; among equal names the first in
    /// run order is removed. The stage leaves the collection before
    /// `on_destroy` runs, so a concurrent second call fails with
    /// [`Error::NotFound`] instead of destroying it twice.
    pub fn unregister(&self, name_or_id: &str) -> Result<StageInfo> {
        let stage = {
            let mut stages = self.stages.write();
            let index = Self::position(&stages, name_or_id)
                .ok_or_else(|| Error::NotFound(name_or_id.to_string()))?;
            stages.remove(index)
        };

        stage.destroy();
        stage.release_subscriptions();

        let info = stage.info();
        log::debug!("Unregistered stage '{}' ({})", info.name, info.id);
        self.bus.publish(EventType::StageUnregistered, EventPayload::Stage(info.clone()));
        Ok(info)
    }

    /// Enable or disable a stage by id or name.
    ///
    /// Takes effect from the next parse; a parse already running keeps the
    /// stages it started with.
    pub fn set_enabled(&self, name_or_id: &str, enabled: bool) -> Result<StageInfo> {
        let stage = self
            .find(name_or_id)
            .ok_or_else(|| Error::NotFound(name_or_id.to_string()))?;
        stage.set_enabled(enabled);

        self.bus.publish(EventType::StageStateChanged, EventPayload::StateChanged {
            stage: stage.name().to_string(),
            enabled,
        });
        Ok(stage.info())
    }

    /// Every registered stage in run order.
    pub fn list(&self) -> Vec<StageInfo> {
        self.stages.read().iter().map(|s| s.info()).collect()
    }

    /// Look up a stage by id or name.
    pub fn get(&self, name_or_id: &str) -> Option<StageInfo> {
        self.find(name_or_id).map(|s| s.info())
    }

    /// Enabled stages in run order, as of now.
    pub fn enabled_stages(&self) -> Vec<Arc<RegisteredStage>> {
        self.stages
            .read()
            .iter()
            .filter(|s| s.is_enabled())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Register every stage whose manifest sits in an immediate
    /// subdirectory of `dir`. Returns the names registered.
    ///
    /// A missing directory is logged and yields nothing. Stages that fail
    /// to load are reported on the bus and skipped.
    pub fn discover(&self, dir: &Path) -> Vec<String> {
        let source = dir.display().to_string();
        self.bus.publish(EventType::StagesLoadStart, EventPayload::LoadStart {
            source: source.clone(),
            count: None,
        });

        let manifests = match Self::scan(dir) {
            Ok(manifests) => manifests,
            Err(err) => {
                log::warn!("Stages directory {} is not readable: {}", source, err);
                self.bus.publish(EventType::StagesLoadError, EventPayload::LoadError {
                    source,
                    error: err.to_string(),
                });
                return Vec::new();
            },
        };

        self.bus.publish(EventType::StagesDiscovered, EventPayload::Discovered {
            directory: dir.to_path_buf(),
            files: manifests.clone(),
        });

        let loaded = self.load_all(&manifests);
        log::info!(
            "Loaded {} of {} stage manifest(s) from {}",
            loaded.len(),
            manifests.len(),
            source
        );
        self.bus.publish(EventType::StagesLoadComplete, EventPayload::LoadComplete {
            directory: dir.to_path_buf(),
            count: loaded.len(),
        });
        loaded
    }

    /// Register stages from explicit manifest paths. Returns the names
    /// registered.
    pub fn load_explicit<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<String> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        self.bus.publish(EventType::StagesLoadStart, EventPayload::LoadStart {
            source: "explicit".to_string(),
            count: Some(paths.len()),
        });

        let loaded = self.load_all(&paths);
        self.bus.publish(
            EventType::StagesManualLoadComplete,
            EventPayload::ManualLoadComplete {
                paths,
                loaded: loaded.clone(),
            },
        );
        loaded
    }

    /// Run [`discover`](Self::discover) unless this registry already has.
    pub fn ensure_discovered(&self, dir: &Path) {
        if !self.discovered.swap(true, Ordering::AcqRel) {
            self.discover(dir);
        }
    }

    /// Whether discovery has run.
    pub fn is_discovered(&self) -> bool {
        self.discovered.load(Ordering::Acquire)
    }

    fn load_all(&self, manifests: &[PathBuf]) -> Vec<String> {
        let mut loaded = Vec::with_capacity(manifests.len());
        for path in manifests {
            match self.load_manifest(path) {
                Ok(info) => loaded.push(info.name),
                Err(err) => {
                    log::warn!("Skipping stage {}: {}", path.display(), err);
                    self.bus.publish(EventType::StagesLoadError, EventPayload::LoadError {
                        source: path.display().to_string(),
                        error: err.to_string(),
                    });
                },
            }
        }
        loaded
    }

    fn load_manifest(&self, path: &Path) -> Result<StageInfo> {
        let loader = Arc::clone(&*self.loader.read());
        let module = loader.load(path)?;
        let spec = catch_unwind(AssertUnwindSafe(|| module.into_spec())).map_err(|panic| {
            Error::InvalidStage(format!(
                "factory for {} panicked: {}",
                path.display(),
                panic_message(panic.as_ref())
            ))
        })?;
        self.register(spec)
    }

    /// Manifest files of the immediate subdirectories of `dir`, sorted by
    /// directory name.
    fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        subdirs.sort();

        Ok(subdirs
            .into_iter()
            .filter_map(|subdir| {
                MANIFEST_FILES
                    .iter()
                    .map(|file| subdir.join(file))
                    .find(|candidate| candidate.is_file())
            })
            .collect())
    }

    fn find(&self, name_or_id: &str) -> Option<Arc<RegisteredStage>> {
        let stages = self.stages.read();
        Self::position(&stages, name_or_id).map(|index| Arc::clone(&stages[index]))
    }

    fn position(stages: &[Arc<RegisteredStage>], name_or_id: &str) -> Option<usize> {
        stages
            .iter()
            .position(|s| s.id() == name_or_id)
            .or_else(|| stages.iter().position(|s| s.matches(name_or_id)))
    }
}

impl fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.list())
            .field("discovered", &self.is_discovered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::events::EventFilter;
    use crate::pipeline::stage::DEFAULT_PRIORITY;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::fs;

    fn registry() -> StageRegistry {
        StageRegistry::new(EventBus::new())
    }

    fn noop(name: &str, priority: i32) -> StageSpec {
        StageSpec::named(name, Ok).priority(priority)
    }

    fn names(registry: &StageRegistry) -> Vec<String> {
        registry.list().into_iter().map(|s| s.name).collect()
    }

    #[test]
    fn test_register_defaults() {
        let registry = registry();
        let info = registry.register(StageSpec::new().process(Ok)).unwrap();
        assert_eq!(info.name, "stage_0");
        assert_eq!(info.priority, DEFAULT_PRIORITY);
        assert!(info.enabled);
        assert!(info.id.starts_with("stage_"));

        let second = registry.register(StageSpec::new().process(Ok)).unwrap();
        assert_eq!(second.name, "stage_1");
        assert_ne!(info.id, second.id);
    }

    #[test]
    fn test_register_requires_process() {
        let registry = registry();
        let err = registry.register(StageSpec::new().name("empty")).unwrap_err();
        assert!(matches!(err, Error::InvalidStage(m) if m.contains("empty")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_explicit_zero_priority_and_disabled() {
        let registry = registry();
        registry.register(noop("late", 10)).unwrap();
        registry.register(noop("first", 0).enabled(false)).unwrap();

        assert_eq!(names(&registry), vec!["first", "late"]);
        assert!(!registry.get("first").unwrap().enabled);
        assert_eq!(registry.enabled_stages().len(), 1);
    }

    #[test]
    fn test_priority_ties_keep_registration_order() {
        let registry = registry();
        registry.register(noop("a", 5)).unwrap();
        registry.register(noop("b", 1)).unwrap();
        registry.register(noop("c", 5)).unwrap();
        registry.register(noop("d", 1)).unwrap();
        assert_eq!(names(&registry), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_duplicate_names_get_distinct_ids() {
        let registry = registry();
        let first = registry.register(noop("dup", 1)).unwrap();
        let second = registry.register(noop("dup", 2)).unwrap();
        assert_ne!(first.id, second.id);

        registry.unregister(&second.id).unwrap();
        assert_eq!(registry.list()[0].id, first.id);
    }

    #[test]
    fn test_set_enabled() {
        let registry = registry();
        let info = registry.register(noop("toggle", 1)).unwrap();

        let updated = registry.set_enabled(&info.id, false).unwrap();
        assert!(!updated.enabled);
        assert!(registry.enabled_stages().is_empty());
        assert_eq!(registry.len(), 1);

        registry.set_enabled("toggle", true).unwrap();
        assert_eq!(registry.enabled_stages().len(), 1);

        assert!(matches!(registry.set_enabled("ghost", true), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_unregister_twice() {
        let registry = registry();
        let destroyed = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&destroyed);
        registry
            .register(noop("gone", 1).on_destroy(move || {
                *counter.lock() += 1;
                Ok(())
            }))
            .unwrap();

        registry.unregister("gone").unwrap();
        assert!(matches!(registry.unregister("gone"), Err(Error::NotFound(_))));
        assert_eq!(*destroyed.lock(), 1);
    }

    #[test]
    fn test_failing_lifecycle_hooks_are_swallowed() {
        let registry = registry();
        registry
            .register(
                noop("fragile", 1)
                    .on_init(|| Err(Error::Other("init".into())))
                    .on_destroy(|| panic!("destroy")),
            )
            .unwrap();
        assert_eq!(registry.len(), 1);
        registry.unregister("fragile").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_releases_subscriptions() {
        let bus = EventBus::new();
        let registry = StageRegistry::new(Arc::clone(&bus));
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        registry
            .register(noop("listener", 1).subscribe(EventType::ParseComplete, move |_| {
                *sink.lock() += 1
            }))
            .unwrap();

        let complete = || EventPayload::ParseComplete {
            content: Default::default(),
        };
        bus.publish(EventType::ParseComplete, complete());
        assert_eq!(*hits.lock(), 1);

        registry.unregister("listener").unwrap();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(EventType::ParseComplete, complete());
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_registry_events() {
        let bus = EventBus::new();
        let registry = StageRegistry::new(Arc::clone(&bus));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(EventFilter::All, move |e| sink.lock().push(e.event_type));

        registry.register(noop("evented", 1)).unwrap();
        registry.set_enabled("evented", false).unwrap();
        registry.unregister("evented").unwrap();

        assert_eq!(*seen.lock(), vec![
            EventType::StageRegistered,
            EventType::StageStateChanged,
            EventType::StageUnregistered,
        ]);
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        for (sub, yaml) in [
            ("a_page", "factory: page\n"),
            ("b_text", "factory: text\nname: plain\n"),
            ("c_broken", "factory: [unclosed\n"),
            ("d_unknown", "factory: nothing\n"),
        ] {
            fs::create_dir(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("stage.yaml"), yaml).unwrap();
        }
        fs::create_dir(dir.path().join("e_yml")).unwrap();
        fs::write(dir.path().join("e_yml").join("stage.yml"), "factory: base\n").unwrap();
        fs::create_dir(dir.path().join("f_empty")).unwrap();
        fs::write(dir.path().join("stage.yaml"), "factory: page\n").unwrap();

        let bus = EventBus::new();
        let registry = StageRegistry::new(Arc::clone(&bus));
        let errors = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&errors);
        bus.subscribe(EventType::StagesLoadError, move |_| *sink.lock() += 1);

        let loaded = registry.discover(dir.path());
        assert_eq!(loaded, vec!["page", "plain", "base"]);
        assert_eq!(*errors.lock(), 2);
        assert_eq!(names(&registry), vec!["base", "page", "plain"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let bus = EventBus::new();
        let registry = StageRegistry::new(Arc::clone(&bus));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(EventFilter::All, move |e| sink.lock().push(e.event_type));

        assert!(registry.discover(Path::new("/definitely/not/here")).is_empty());
        assert_eq!(*seen.lock(), vec![EventType::StagesLoadStart, EventType::StagesLoadError]);
    }

    #[test]
    fn test_ensure_discovered_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("page")).unwrap();
        fs::write(dir.path().join("page").join("stage.yaml"), "factory: page\n").unwrap();

        let registry = registry();
        registry.ensure_discovered(dir.path());
        registry.ensure_discovered(dir.path());
        assert!(registry.is_discovered());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        fs::write(&good, "factory: text\npriority: 3\n").unwrap();
        let missing = dir.path().join("missing.yaml");

        let bus = EventBus::new();
        let registry = StageRegistry::new(Arc::clone(&bus));
        let completed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&completed);
        bus.subscribe(EventType::StagesManualLoadComplete, move |e| {
            if let EventPayload::ManualLoadComplete { loaded, .. } = &e.payload {
                *sink.lock() = Some(loaded.clone());
            }
        });

        let loaded = registry.load_explicit(&[good, missing]);
        assert_eq!(loaded, vec!["default"]);
        assert_eq!(completed.lock().clone(), Some(vec!["default".to_string()]));
        assert_eq!(registry.get("default").unwrap().priority, 3);
    }

    #[test]
    fn test_custom_loader() {
        struct Fixed;
        impl StageLoader for Fixed {
            fn load(&self, _manifest: &Path) -> Result<crate::pipeline::loader::StageModule> {
                Ok(crate::pipeline::loader::StageModule::Descriptor(
                    StageSpec::named("fixed", Ok),
                ))
            }
        }

        let registry = registry();
        registry.set_loader(Arc::new(Fixed));
        assert_eq!(registry.load_explicit(&["anything.yaml"]), vec!["fixed"]);
    }

    proptest! {
        #[test]
        fn prop_list_is_stably_sorted(priorities in proptest::collection::vec(-5i32..5, 0..24)) {
            let registry = registry();
            for (i, priority) in priorities.iter().enumerate() {
                registry.register(noop(&format!("s{}", i), *priority)).unwrap();
            }

            let mut expected: Vec<(i32, usize)> = priorities.iter().copied().zip(0..).collect();
            expected.sort_by_key(|(priority, _)| *priority);
            let expected: Vec<String> = expected.into_iter().map(|(_, i)| format!("s{}", i)).collect();

            prop_assert_eq!(names(&registry), expected);
        }
    }
}
