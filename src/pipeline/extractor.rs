//! Pipeline orchestrator.
//!
//! An [`Extractor`] opens the package, loads the main document, and runs the
//! enabled stages of its registry in priority order over a shared
//! [`ParseContext`]. A failing stage is reported and skipped, or aborts the
//! parse when [`ParseOptions::stop_on_error`] is set.

use crate::common::error::{Error, Result};
use crate::ooxml::docx::Document;
use crate::ooxml::opc::OpcPackage;
use crate::pipeline::context::{Content, ParseContext};
use crate::pipeline::events::{EventBus, EventPayload, EventType};
use crate::pipeline::options::ParseOptions;
use crate::pipeline::registry::StageRegistry;
use crate::pipeline::stages::{BaseStage, PageStage, TextStage};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Instant;

/// Where the most recent parse stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParseState {
    #[default]
    Idle,
    /// Opening the package and loading the document
    Loading,
    /// Running stage `index` (0-based) of `of`
    Running { stage: String, index: usize, of: usize },
    Completed,
    Failed,
}

/// Runs registered stages over documents.
///
/// # Examples
///
/// ```rust,no_run
/// use litchi_layout::pipeline::{Extractor, ParseOptions};
///
/// let extractor = Extractor::with_default_stages()?;
/// let content = extractor.parse(&std::fs::read("report.docx")?, &ParseOptions::default())?;
/// println!("{}", serde_json::to_string_pretty(&content)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Extractor {
    bus: Arc<EventBus>,
    registry: Arc<StageRegistry>,
    state: RwLock<ParseState>,
}

impl Extractor {
    /// Extractor with its own bus and an empty registry.
    pub fn new() -> Self {
        let bus = EventBus::new();
        let registry = Arc::new(StageRegistry::new(Arc::clone(&bus)));
        Self::with_registry(registry)
    }

    /// Extractor over an existing registry, publishing on the registry's bus.
    pub fn with_registry(registry: Arc<StageRegistry>) -> Self {
        Self {
            bus: Arc::clone(registry.bus()),
            registry,
            state: RwLock::new(ParseState::Idle),
        }
    }

    /// Extractor with the `base`, `page` and `default` stages registered.
    pub fn with_default_stages() -> Result<Self> {
        let extractor = Self::new();
        extractor.registry.register(BaseStage)?;
        extractor.registry.register(PageStage)?;
        extractor.registry.register(TextStage)?;
        Ok(extractor)
    }

    #[inline]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    #[inline]
    pub fn registry(&self) -> &Arc<StageRegistry> {
        &self.registry
    }

    /// State of the most recent parse.
    pub fn state(&self) -> ParseState {
        self.state.read().clone()
    }

    /// Parse a `.docx` package and return the content built by the stages.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingInput`] for empty `data`
    /// - archive and document errors while loading
    /// - [`Error::StageExecution`] from the first failing stage, only when
    ///   `stop_on_error` is set
    pub fn parse(&self, data: &[u8], options: &ParseOptions) -> Result<Content> {
        if data.is_empty() {
            return Err(Error::MissingInput);
        }
        let started = Instant::now();
        self.transition(ParseState::Loading);

        if options.auto_load_stages {
            self.registry.ensure_discovered(options.stages_dir());
        }

        let options = Arc::new(options.clone());
        self.bus.publish(EventType::ParseStart, EventPayload::ParseStart {
            options: Arc::clone(&options),
        });

        let (archive, document) = match Self::load(data) {
            Ok(loaded) => loaded,
            Err(err) => {
                self.bus.publish(EventType::ParseError, EventPayload::ParseError {
                    stage: None,
                    error: err.to_string(),
                });
                self.transition(ParseState::Failed);
                return Err(err);
            },
        };
        self.bus.publish(EventType::ParseLoaded, EventPayload::ParseLoaded {
            document: Arc::clone(&document),
        });

        let mut ctx = ParseContext::new(document, archive, Arc::clone(&options));
        let stages = self.registry.enabled_stages();
        let total = stages.len();
        self.bus
            .publish(EventType::StagesProcessing, EventPayload::Processing { count: total });

        for (index, stage) in stages.iter().enumerate() {
            let name = stage.name().to_string();
            self.transition(ParseState::Running {
                stage: name.clone(),
                index,
                of: total,
            });
            self.bus.publish(EventType::StageProcessStart, EventPayload::ProcessStart {
                stage: name.clone(),
                priority: stage.priority(),
            });

            let stage_started = Instant::now();
            match stage.run(ctx.clone()) {
                Ok(next) => {
                    ctx = next;
                    log::debug!("Stage '{}' finished in {:?}", name, stage_started.elapsed());
                    self.bus
                        .publish(EventType::StageProcessComplete, EventPayload::ProcessComplete {
                            stage: name,
                            success: true,
                        });
                },
                Err(err) => {
                    let err = Error::in_stage(name.clone(), err);
                    stage.report_error(&err, &ctx);
                    self.bus.publish(EventType::StageProcessError, EventPayload::ProcessError {
                        stage: name.clone(),
                        error: err.to_string(),
                    });

                    if options.stop_on_error {
                        self.bus.publish(EventType::ParseError, EventPayload::ParseError {
                            stage: Some(name),
                            error: err.to_string(),
                        });
                        self.transition(ParseState::Failed);
                        return Err(err);
                    }
                    log::warn!("{}; continuing with the previous context", err);
                },
            }
        }

        self.transition(ParseState::Completed);
        log::debug!("Parse completed in {:?} with {} stage(s)", started.elapsed(), total);
        self.bus.publish(EventType::ParseComplete, EventPayload::ParseComplete {
            content: ctx.content.clone(),
        });
        Ok(ctx.content)
    }

    fn load(data: &[u8]) -> Result<(Arc<OpcPackage>, Arc<Document>)> {
        let archive = OpcPackage::from_bytes(data)?;
        let document = Document::from_package(&archive)?;
        Ok((Arc::new(archive), Arc::new(document)))
    }

    fn transition(&self, next: ParseState) {
        log::debug!("Parse state: {:?}", next);
        *self.state.write() = next;
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
