//! Unified error types for the extraction pipeline.
//!
//! This module provides a unified error type that encompasses archive, markup,
//! registry and stage failures, presenting a consistent API to users.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
