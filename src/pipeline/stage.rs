//! Stage descriptors.
//!
//! A stage is a named transform over the [`ParseContext`] with optional
//! lifecycle hooks. Stages are described either by implementing [`Stage`]
//! or by assembling a [`StageSpec`] from closures; both end up as a
//! [`RegisteredStage`] inside the registry.

use crate::common::error::{Error, Result};
use crate::pipeline::context::ParseContext;
use crate::pipeline::events::{EventBus, EventFilter, EventHandler, Subscription, panic_message};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Priority of a stage that does not declare one.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Context transform of a stage.
pub type ProcessFn = Arc<dyn Fn(ParseContext) -> Result<ParseContext> + Send + Sync>;
/// `on_before_process` / `on_after_process` hook.
pub type HookFn = Arc<dyn Fn(&ParseContext) -> Result<()> + Send + Sync>;
/// `on_error` hook.
pub type ErrorHookFn = Arc<dyn Fn(&Error, &ParseContext) -> Result<()> + Send + Sync>;
/// `on_init` / `on_destroy` hook.
pub type LifecycleFn = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// A pipeline stage.
///
/// Only [`name`](Stage::name) and [`process`](Stage::process) are required;
/// every hook defaults to a no-op.
pub trait Stage: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Lower runs earlier.
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn process(&self, ctx: ParseContext) -> Result<ParseContext>;

    fn on_init(&self) -> Result<()> {
        Ok(())
    }

    fn on_before_process(&self, _ctx: &ParseContext) -> Result<()> {
        Ok(())
    }

    fn on_after_process(&self, _ctx: &ParseContext) -> Result<()> {
        Ok(())
    }

    fn on_error(&self, _error: &Error, _ctx: &ParseContext) -> Result<()> {
        Ok(())
    }

    fn on_destroy(&self) -> Result<()> {
        Ok(())
    }

    /// Event handlers wired to the bus while the stage is registered.
    fn subscriptions(&self) -> Vec<(EventFilter, EventHandler)> {
        Vec::new()
    }
}

/// Builder-style stage descriptor.
///
/// Unset fields take their defaults at registration: the name becomes
/// `stage_<n>`, the priority [`DEFAULT_PRIORITY`], and the stage starts
/// enabled. A descriptor without a process function is rejected.
#[derive(Clone, Default)]
pub struct StageSpec {
    pub(crate) name: Option<String>,
    pub(crate) priority: Option<i32>,
    pub(crate) enabled: Option<bool>,
    pub(crate) process: Option<ProcessFn>,
    pub(crate) on_init: Option<LifecycleFn>,
    pub(crate) on_before_process: Option<HookFn>,
    pub(crate) on_after_process: Option<HookFn>,
    pub(crate) on_error: Option<ErrorHookFn>,
    pub(crate) on_destroy: Option<LifecycleFn>,
    pub(crate) subscribe: Vec<(EventFilter, EventHandler)>,
    pub(crate) meta: Map<String, Value>,
}

impl StageSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor with a name and a process function.
    pub fn named<F>(name: impl Into<String>, process: F) -> Self
    where
        F: Fn(ParseContext) -> Result<ParseContext> + Send + Sync + 'static,
    {
        Self::new().name(name).process(process)
    }

    /// Wrap a [`Stage`] implementation.
    pub fn from_stage<S: Stage>(stage: S) -> Self {
        let stage = Arc::new(stage);
        let subscribe = stage.subscriptions();

        let s = Arc::clone(&stage);
        let process: ProcessFn = Arc::new(move |ctx| s.process(ctx));
        let s = Arc::clone(&stage);
        let on_init: LifecycleFn = Arc::new(move || s.on_init());
        let s = Arc::clone(&stage);
        let on_before_process: HookFn = Arc::new(move |ctx| s.on_before_process(ctx));
        let s = Arc::clone(&stage);
        let on_after_process: HookFn = Arc::new(move |ctx| s.on_after_process(ctx));
        let s = Arc::clone(&stage);
        let on_error: ErrorHookFn = Arc::new(move |err, ctx| s.on_error(err, ctx));
        let s = Arc::clone(&stage);
        let on_destroy: LifecycleFn = Arc::new(move || s.on_destroy());

        Self {
            name: Some(stage.name().to_string()),
            priority: Some(stage.priority()),
            enabled: None,
            process: Some(process),
            on_init: Some(on_init),
            on_before_process: Some(on_before_process),
            on_after_process: Some(on_after_process),
            on_error: Some(on_error),
            on_destroy: Some(on_destroy),
            subscribe,
            meta: Map::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn process<F>(mut self, f: F) -> Self
    where
        F: Fn(ParseContext) -> Result<ParseContext> + Send + Sync + 'static,
    {
        self.process = Some(Arc::new(f));
        self
    }

    pub fn on_init<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.on_init = Some(Arc::new(f));
        self
    }

    pub fn on_before_process<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParseContext) -> Result<()> + Send + Sync + 'static,
    {
        self.on_before_process = Some(Arc::new(f));
        self
    }

    pub fn on_after_process<F>(mut self, f: F) -> Self
    where
        F: Fn(&ParseContext) -> Result<()> + Send + Sync + 'static,
    {
        self.on_after_process = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error, &ParseContext) -> Result<()> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_destroy<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.on_destroy = Some(Arc::new(f));
        self
    }

    /// Subscribe `handler` to the bus for as long as the stage is registered.
    pub fn subscribe<F>(mut self, filter: impl Into<EventFilter>, handler: F) -> Self
    where
        F: Fn(&crate::pipeline::events::Event) + Send + Sync + 'static,
    {
        self.subscribe.push((filter.into(), Arc::new(handler)));
        self
    }

    /// Attach free-form metadata reported by [`StageInfo`].
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Name, if one was set.
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl<S: Stage> From<S> for StageSpec {
    fn from(stage: S) -> Self {
        StageSpec::from_stage(stage)
    }
}

impl fmt::Debug for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageSpec")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("has_process", &self.process.is_some())
            .field("subscriptions", &self.subscribe.len())
            .field("meta", &self.meta)
            .finish()
    }
}

/// Public view of a registered stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageInfo {
    pub id: String,
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

/// A stage as held by the registry.
pub struct RegisteredStage {
    id: String,
    name: String,
    priority: i32,
    enabled: AtomicBool,
    meta: Map<String, Value>,
    process: ProcessFn,
    on_init: Option<LifecycleFn>,
    on_before_process: Option<HookFn>,
    on_after_process: Option<HookFn>,
    on_error: Option<ErrorHookFn>,
    on_destroy: Option<LifecycleFn>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl RegisteredStage {
    /// Build the entry for a descriptor that is known to have a process
    /// function and a resolved name.
    pub(crate) fn new(id: String, name: String, process: ProcessFn, spec: StageSpec) -> Self {
        Self {
            id,
            name,
            priority: spec.priority.unwrap_or(DEFAULT_PRIORITY),
            enabled: AtomicBool::new(spec.enabled.unwrap_or(true)),
            meta: spec.meta,
            process,
            on_init: spec.on_init,
            on_before_process: spec.on_before_process,
            on_after_process: spec.on_after_process,
            on_error: spec.on_error,
            on_destroy: spec.on_destroy,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn info(&self) -> StageInfo {
        StageInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            priority: self.priority,
            enabled: self.is_enabled(),
            meta: self.meta.clone(),
        }
    }

    /// Whether `key` is this stage's id or name.
    #[inline]
    pub(crate) fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }

    /// Wire handlers to the bus and keep their handles.
    pub(crate) fn subscribe_all(&self, bus: &Arc<EventBus>, handlers: Vec<(EventFilter, EventHandler)>) {
        let mut subscriptions = self.subscriptions.lock();
        for (filter, handler) in handlers {
            subscriptions.push(bus.subscribe_handler(filter, handler));
        }
    }

    /// End every subscription made at registration.
    pub(crate) fn release_subscriptions(&self) {
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.unsubscribe();
        }
    }

    /// Run `on_before_process`, `process` and `on_after_process`.
    ///
    /// A panic in any of them is turned into an error.
    pub(crate) fn run(&self, ctx: ParseContext) -> Result<ParseContext> {
        let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<ParseContext> {
            if let Some(hook) = &self.on_before_process {
                hook(&ctx)?;
            }
            let next = (self.process)(ctx)?;
            if let Some(hook) = &self.on_after_process {
                hook(&next)?;
            }
            Ok(next)
        }));
        outcome.unwrap_or_else(|panic| {
            Err(Error::Other(format!("panicked: {}", panic_message(panic.as_ref()))))
        })
    }

    pub(crate) fn init(&self) {
        if let Some(hook) = &self.on_init {
            self.guard("on_init", || hook());
        }
    }

    pub(crate) fn destroy(&self) {
        if let Some(hook) = &self.on_destroy {
            self.guard("on_destroy", || hook());
        }
    }

    pub(crate) fn report_error(&self, error: &Error, ctx: &ParseContext) {
        if let Some(hook) = &self.on_error {
            self.guard("on_error", || hook(error, ctx));
        }
    }

    /// Run a hook whose failure must not escape: errors and panics are logged.
    fn guard(&self, hook: &str, f: impl FnOnce() -> Result<()>) {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(())) => {},
            Ok(Err(err)) => log::error!("Stage '{}' {} failed: {}", self.name, hook, err),
            Err(panic) => log::error!(
                "Stage '{}' {} panicked: {}",
                self.name,
                hook,
                panic_message(panic.as_ref())
            ),
        }
    }
}

impl fmt::Debug for RegisteredStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredStage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
