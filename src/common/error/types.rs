//! Unified error types for the extraction pipeline.
//!
//! This module provides a single error type covering archive access, markup
//! decoding, unit math, stage registration and stage execution, presenting a
//! consistent API to callers of [`crate::parse`].
use thiserror::Error;

/// Main error type for layout extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// No document bytes were supplied to the parser
    #[error("Document data must be provided")]
    MissingInput,

    /// The package container could not be opened
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// A part is missing from the package
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// A length value could not be interpreted
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// A relationship id has no entry in the relationship manifest
    #[error("Relationship not found: {0}")]
    RelationshipNotFound(String),

    /// A stage descriptor is unusable (e.g. it has no process function)
    #[error("Invalid stage: {0}")]
    InvalidStage(String),

    /// No registered stage matches the given name or id
    #[error("Stage not found: {0}")]
    NotFound(String),

    /// A stage hook or transform failed
    #[error("Stage '{stage}' failed: {source}")]
    StageExecution {
        /// Name of the failing stage
        stage: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Stage manifest could not be read
    #[error("Invalid stage manifest: {0}")]
    InvalidManifest(String),

    /// Invalid or unexpected document structure
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// Content could not be converted into the output data tree
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a failure raised inside a stage.
    ///
    /// Errors that already carry stage attribution are returned unchanged.
    pub fn in_stage(stage: impl Into<String>, source: Error) -> Self {
        match source {
            err @ Error::StageExecution { .. } => err,
            other => Error::StageExecution {
                stage: stage.into(),
                source: Box::new(other),
            },
        }
    }

    /// Name of the stage this error is attributed to, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            Error::StageExecution { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Result type for layout extraction.
pub type Result<T> = std::result::Result<T, Error>;
