//! End-to-end compare and refresh flows over on-disk captures.
//!
//! Configuration errors (unknown scenario, malformed expectations) surface
//! before the capture is read; discrepancies never surface as errors.

use std::fs;
use std::path::{Path, PathBuf};

use glparity_error::{ParityError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::{CaptureInputs, HarnessConfig};
use crate::console::parse_console_output;
use crate::diff::{ComparisonResult, diff_events};
use crate::event::{EventOrigin, LogEvent};
use crate::expectation::ExpectedEvent;
use crate::merge::merge_events;
use crate::metadata::RunMetadata;
use crate::refresh::refresh_scenario;
use crate::report::{ComparisonSummary, render_report};

/// A decoded parity run.
#[derive(Debug, Clone)]
pub struct Capture {
    pub metadata: RunMetadata,
    /// Console and metadata events in merged order.
    pub events: Vec<LogEvent>,
    /// SHA-256 over the console text followed by the metadata bytes.
    pub capture_hash: String,
}

/// Read, decode and merge the artifacts of a run.
pub fn load_capture(config: &HarnessConfig, inputs: &CaptureInputs) -> Result<Capture> {
    let console_path = config.resolve(&inputs.console_log);
    let metadata_path = config.resolve(&inputs.metadata);
    let console_text = read_text(&console_path)?;
    let metadata_text = read_text(&metadata_path)?;

    let metadata = RunMetadata::from_json(&metadata_text, &metadata_path)?;
    let console_events = parse_console_output(&console_text, EventOrigin::Console);
    let metadata_events = metadata.events();
    info!(
        console = %console_path.display(),
        console_events = console_events.len(),
        metadata_events = metadata_events.len(),
        "capture decoded"
    );

    Ok(Capture {
        capture_hash: capture_hash(console_text.as_bytes(), metadata_text.as_bytes()),
        events: merge_events(console_events, metadata_events),
        metadata,
    })
}

/// Fingerprint of a capture, for correlating reports with their inputs.
#[must_use]
pub fn capture_hash(console: &[u8], metadata: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(console);
    hasher.update(metadata);
    format!("{:x}", hasher.finalize())
}

/// Outcome of comparing one capture against one scenario.
#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub expected: Vec<ExpectedEvent>,
    pub capture: Capture,
    pub tolerance_secs: f64,
    pub report: String,
    pub summary: ComparisonSummary,
}

impl CompareOutcome {
    #[must_use]
    pub fn ok(&self) -> bool {
        self.summary.ok
    }

    /// The full alignment, borrowed from this outcome.
    #[must_use]
    pub fn result(&self) -> ComparisonResult<'_> {
        diff_events(&self.expected, &self.capture.events, self.tolerance_secs)
    }
}

/// Compare a capture against `scenario` from the configured catalogue.
pub fn compare_capture(
    config: &HarnessConfig,
    scenario: &str,
    inputs: &CaptureInputs,
) -> Result<CompareOutcome> {
    let catalog = Catalog::load(&config.resolved_catalog_path())?;
    let expected = catalog.expected_events(scenario)?;
    let capture = load_capture(config, inputs)?;

    let tolerance_secs = config.timestamp_tolerance_secs;
    let result = diff_events(&expected, &capture.events, tolerance_secs);
    let report = render_report(&result);
    let summary = ComparisonSummary::from_result(
        scenario,
        &result,
        tolerance_secs,
        capture.capture_hash.clone(),
    );
    if summary.ok {
        info!(scenario, matched = summary.counts.matched, "capture matches catalogue");
    } else {
        warn!(
            scenario,
            missing = summary.counts.missing,
            unexpected = summary.counts.unexpected,
            timestamp_violations = summary.counts.timestamp_violations,
            "capture diverges from catalogue"
        );
    }

    Ok(CompareOutcome {
        expected,
        capture,
        tolerance_secs,
        report,
        summary,
    })
}

/// What a refresh wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub scenario: String,
    pub events: usize,
    pub catalog_path: PathBuf,
    pub capture_hash: String,
}

/// Regenerate `scenario` from a known-good capture and rewrite the catalogue.
///
/// The catalogue must already exist; other scenarios are preserved.
pub fn refresh_capture(
    config: &HarnessConfig,
    scenario: &str,
    inputs: &CaptureInputs,
) -> Result<RefreshSummary> {
    let catalog_path = config.resolved_catalog_path();
    let mut catalog = Catalog::load(&catalog_path)?;
    let capture = load_capture(config, inputs)?;

    let events = refresh_scenario(&mut catalog, scenario, &capture.events, &capture.metadata)?;
    catalog.save(&catalog_path)?;

    Ok(RefreshSummary {
        scenario: scenario.to_owned(),
        events,
        catalog_path,
        capture_hash: capture.capture_hash,
    })
}

/// Write a JSON document (pretty, trailing newline), creating parent
/// directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ParityError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut text = serde_json::to_string_pretty(value)
        .map_err(|err| ParityError::internal(format!("failed to serialize JSON: {err}")))?;
    text.push('\n');
    fs::write(path, text).map_err(|source| ParityError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ParityError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}
