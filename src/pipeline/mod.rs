//! Stage pipeline.
//!
//! The pipeline turns a `.docx` package into a plain JSON-like content tree
//! by running an ordered chain of stages over a shared [`ParseContext`]:
//!
//! - [`events`]: synchronous event bus for lifecycle notifications
//! - [`stage`]: stage descriptors and the [`Stage`] trait
//! - [`registry`]: ordered stage collection, discovery and explicit loading
//! - [`loader`]: manifest-driven, host-controlled stage loading
//! - [`extractor`]: the orchestrator running a parse
//! - [`stages`]: built-in `base`, `page` and `default` stages
//!
//! # Example
//!
//! ```rust,no_run
//! use litchi_layout::pipeline::{Extractor, ParseOptions, StageSpec};
//! use serde_json::Value;
//!
//! let extractor = Extractor::with_default_stages()?;
//! extractor.registry().register(
//!     StageSpec::named("stamp", |mut ctx| {
//!         ctx.content.insert("source".into(), Value::from("scanner"));
//!         Ok(ctx)
//!     })
//!     .priority(50),
//! )?;
//!
//! let options = ParseOptions::default().with_auto_load_stages(false);
//! let content = extractor.parse(&std::fs::read("letter.docx")?, &options)?;
//! assert_eq!(content["source"], "scanner");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod context;
pub mod events;
pub mod extractor;
pub mod loader;
pub mod options;
pub mod registry;
pub mod stage;
pub mod stages;


pub use context::{Capabilities, Content, ParseContext, THEME_CAPABILITY, UNITS_CAPABILITY};
pub use events::{Event, EventBus, EventFilter, EventPayload, EventType, Subscription};
pub use extractor::{Extractor, ParseState};
pub use loader::{FactoryTable, StageLoader, StageManifest, StageModule};
pub use options::ParseOptions;
pub use registry::StageRegistry;
pub use stage::{DEFAULT_PRIORITY, Stage, StageInfo, StageSpec};
