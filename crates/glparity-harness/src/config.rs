//! Harness configuration.

use std::path::{Path, PathBuf};

use crate::diff::DEFAULT_TIMESTAMP_TOLERANCE_SECS;

/// Catalogue location, relative to the workspace root.
pub const DEFAULT_CATALOG_PATH: &str = "tests/parity/engine_logs/catalog.json";

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    /// Root against which relative paths are resolved.
    pub workspace_root: PathBuf,
    pub catalog_path: PathBuf,
    /// Allowed drift between a timestamp hint and the observed timestamp.
    pub timestamp_tolerance_secs: f64,
    pub verbose: bool,
}

impl HarnessConfig {
    #[must_use]
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            timestamp_tolerance_secs: DEFAULT_TIMESTAMP_TOLERANCE_SECS,
            verbose: false,
        }
    }

    #[must_use]
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, seconds: f64) -> Self {
        self.timestamp_tolerance_secs = seconds;
        self
    }

    #[must_use]
    pub fn resolved_catalog_path(&self) -> PathBuf {
        self.resolve(&self.catalog_path)
    }

    /// Resolve `path` against the workspace root unless it is absolute.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            self.workspace_root.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// The two artifacts a parity run hands over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureInputs {
    pub console_log: PathBuf,
    pub metadata: PathBuf,
}

impl CaptureInputs {
    #[must_use]
    pub fn new(console_log: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            console_log: console_log.into(),
            metadata: metadata.into(),
        }
    }
}
