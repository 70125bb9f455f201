//! Parse options.
//!
//! Options are plain serde data so hosts can keep them next to their own
//! configuration. The YAML keys are camelCase; the older `autoLoadPlugins`
//! and `pluginsDir` spellings are accepted as aliases.
//!
//! ```yaml
//! autoLoadStages: false
//! stagesDir: ./stages
//! stopOnError: true
//! dpi: 144
//! ```

use crate::common::error::{Error, Result};
use crate::common::unit::DEFAULT_DPI;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory scanned for stage manifests when none is configured.
pub const DEFAULT_STAGES_DIR: &str = "stages";

/// Options for a single parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Discover stage manifests before the first parse
    #[serde(alias = "autoLoadPlugins")]
    pub auto_load_stages: bool,
    /// Where discovery looks; `stages` relative to the working directory if unset
    #[serde(alias = "pluginsDir", skip_serializing_if = "Option::is_none")]
    pub stages_dir: Option<PathBuf>,
    /// Abort the parse at the first failing stage
    pub stop_on_error: bool,
    /// Output resolution for length conversion
    pub dpi: f64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            auto_load_stages: true,
            stages_dir: None,
            stop_on_error: false,
            dpi: DEFAULT_DPI,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("Invalid parse options: {}", e)))
    }

    /// Read options from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn with_auto_load_stages(mut self, enabled: bool) -> Self {
        self.auto_load_stages = enabled;
        self
    }

    pub fn with_stages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.stages_dir = Some(dir.into());
        self
    }

    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }

    /// Directory that discovery scans.
    pub fn stages_dir(&self) -> &Path {
        self.stages_dir
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_STAGES_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(options.auto_load_stages);
        assert!(!options.stop_on_error);
        assert_eq!(options.dpi, 96.0);
        assert_eq!(options.stages_dir(), Path::new("stages"));
    }

    #[test]
    fn test_from_yaml() {
        let options = ParseOptions::from_yaml_str("stopOnError: true\ndpi: 144\n").unwrap();
        assert!(options.stop_on_error);
        assert!(options.auto_load_stages);
        assert_eq!(options.dpi, 144.0);

        let options =
            ParseOptions::from_yaml_str("autoLoadPlugins: false\npluginsDir: /opt/stages\n").unwrap();
        assert!(!options.auto_load_stages);
        assert_eq!(options.stages_dir(), Path::new("/opt/stages"));
    }

    #[test]
    fn test_from_yaml_rejects_wrong_types() {
        assert!(matches!(
            ParseOptions::from_yaml_str("dpi: [1, 2]"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_builder() {
        let options = ParseOptions::new()
            .with_auto_load_stages(false)
            .with_stages_dir("custom")
            .with_stop_on_error(true)
            .with_dpi(72.0);
        assert_eq!(options.stages_dir(), Path::new("custom"));
        assert!(options.stop_on_error);
        assert_eq!(options.dpi, 72.0);
    }
}
