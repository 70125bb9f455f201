//! Event bus.
//!
//! Typed, synchronous publish/subscribe used by the registry and the
//! extractor to report what they are doing. Delivery happens on the
//! publishing thread, in subscription order. No lock is held while a handler
//! runs, so handlers may publish or (un)subscribe themselves.
//!
//! A panicking handler is logged and skipped; it never reaches the publisher
//! and does not stop delivery to the remaining subscribers.

use crate::ooxml::docx::Document;
use crate::pipeline::context::Content;
use crate::pipeline::options::ParseOptions;
use crate::pipeline::stage::StageInfo;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use smallvec::SmallVec;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Kinds of events published by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    StageRegistered,
    StageUnregistered,
    StageStateChanged,
    StagesLoadStart,
    StagesLoadError,
    StagesDiscovered,
    StagesLoadComplete,
    StagesManualLoadComplete,
    StagesProcessing,
    StageProcessStart,
    StageProcessComplete,
    StageProcessError,
    ParseStart,
    ParseLoaded,
    ParseError,
    ParseComplete,
}

impl EventType {
    pub const ALL: [EventType; 16] = [
        EventType::StageRegistered,
        EventType::StageUnregistered,
        EventType::StageStateChanged,
        EventType::StagesLoadStart,
        EventType::StagesLoadError,
        EventType::StagesDiscovered,
        EventType::StagesLoadComplete,
        EventType::StagesManualLoadComplete,
        EventType::StagesProcessing,
        EventType::StageProcessStart,
        EventType::StageProcessComplete,
        EventType::StageProcessError,
        EventType::ParseStart,
        EventType::ParseLoaded,
        EventType::ParseError,
        EventType::ParseComplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::StageRegistered => "STAGE_REGISTERED",
            EventType::StageUnregistered => "STAGE_UNREGISTERED",
            EventType::StageStateChanged => "STAGE_STATE_CHANGED",
            EventType::StagesLoadStart => "STAGES_LOAD_START",
            EventType::StagesLoadError => "STAGES_LOAD_ERROR",
            EventType::StagesDiscovered => "STAGES_DISCOVERED",
            EventType::StagesLoadComplete => "STAGES_LOAD_COMPLETE",
            EventType::StagesManualLoadComplete => "STAGES_MANUAL_LOAD_COMPLETE",
            EventType::StagesProcessing => "STAGES_PROCESSING",
            EventType::StageProcessStart => "STAGE_PROCESS_START",
            EventType::StageProcessComplete => "STAGE_PROCESS_COMPLETE",
            EventType::StageProcessError => "STAGE_PROCESS_ERROR",
            EventType::ParseStart => "PARSE_START",
            EventType::ParseLoaded => "PARSE_LOADED",
            EventType::ParseError => "PARSE_ERROR",
            EventType::ParseComplete => "PARSE_COMPLETE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data carried by an event.
///
/// Errors travel as their display text so payloads stay cloneable.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// Registration, removal
    Stage(StageInfo),
    StateChanged { stage: String, enabled: bool },
    /// `source` is the scanned directory or `explicit` for manual loading
    LoadStart { source: String, count: Option<usize> },
    LoadError { source: String, error: String },
    Discovered { directory: PathBuf, files: Vec<PathBuf> },
    LoadComplete { directory: PathBuf, count: usize },
    ManualLoadComplete { paths: Vec<PathBuf>, loaded: Vec<String> },
    Processing { count: usize },
    ProcessStart { stage: String, priority: i32 },
    ProcessComplete { stage: String, success: bool },
    ProcessError { stage: String, error: String },
    ParseStart { options: Arc<ParseOptions> },
    ParseLoaded { document: Arc<Document> },
    /// `stage` is `None` when loading the document failed
    ParseError { stage: Option<String>, error: String },
    ParseComplete { content: Content },
}

/// A published event.
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

/// Which events a subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Types(SmallVec<[EventType; 4]>),
}

impl EventFilter {
    #[inline]
    pub fn matches(&self, event_type: EventType) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Types(types) => types.contains(&event_type),
        }
    }
}

impl From<EventType> for EventFilter {
    fn from(event_type: EventType) -> Self {
        EventFilter::Types(smallvec::smallvec![event_type])
    }
}

impl From<&[EventType]> for EventFilter {
    fn from(types: &[EventType]) -> Self {
        EventFilter::Types(SmallVec::from_slice(types))
    }
}

impl<const N: usize> From<[EventType; N]> for EventFilter {
    fn from(types: [EventType; N]) -> Self {
        EventFilter::Types(types.into_iter().collect())
    }
}

impl From<Vec<EventType>> for EventFilter {
    fn from(types: Vec<EventType>) -> Self {
        EventFilter::Types(SmallVec::from_vec(types))
    }
}

/// Callback invoked for each matching event.
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscriber {
    id: u64,
    filter: EventFilter,
    handler: EventHandler,
    active: Arc<AtomicBool>,
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to end it.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    bus: Weak<EventBus>,
}

impl Subscription {
    /// Stop delivery to this subscriber.
    ///
    /// Takes effect immediately, including for a publish already in progress
    /// on another thread or further up the current call stack.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::Release);
        if let Some(bus) = self.bus.upgrade() {
            bus.subscribers.write().retain(|s| s.id != self.id);
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Synchronous publish/subscribe hub.
pub struct EventBus {
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Register `handler` for the events selected by `filter`.
    pub fn subscribe<F>(self: &Arc<Self>, filter: impl Into<EventFilter>, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subscribe_handler(filter.into(), Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn subscribe_handler(self: &Arc<Self>, filter: EventFilter, handler: EventHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        self.subscribers.write().push(Arc::new(Subscriber {
            id,
            filter,
            handler,
            active: Arc::clone(&active),
        }));
        Subscription {
            id,
            active,
            bus: Arc::downgrade(self),
        }
    }

    /// Deliver an event to every matching subscriber.
    pub fn publish(&self, event_type: EventType, payload: EventPayload) {
        let snapshot: Vec<Arc<Subscriber>> = self
            .subscribers
            .read()
            .iter()
            .filter(|s| s.filter.matches(event_type))
            .cloned()
            .collect();
        if snapshot.is_empty() {
            return;
        }

        let event = Event {
            event_type,
            timestamp: Utc::now(),
            payload,
        };

        for subscriber in snapshot {
            if !subscriber.active.load(Ordering::Acquire) {
                continue;
            }
            let handler = &subscriber.handler;
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                log::error!(
                    "Subscriber {} panicked handling {}: {}",
                    subscriber.id,
                    event_type,
                    panic_message(panic.as_ref())
                );
            }
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Best-effort text of a caught panic.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
