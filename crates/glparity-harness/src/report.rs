//! Human-readable comparison reports and the machine-readable summary.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::diff::{ComparisonCounts, ComparisonResult};

/// Line printed when every section is empty.
pub const ALL_MATCHED: &str = "All events matched the catalogue expectations.";

/// Render the operator report for a comparison.
#[must_use]
pub fn render_report(result: &ComparisonResult<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    if !result.missing.is_empty() {
        lines.push("Missing expected events:".to_owned());
        for expected in &result.missing {
            lines.push(format!("  - {}", expected.describe()));
        }
    }
    if !result.unexpected.is_empty() {
        lines.push("Unexpected events:".to_owned());
        for event in &result.unexpected {
            lines.push(format!(
                "  - {} {}: {}",
                format_stamp(event.timestamp),
                event.kind,
                event.text
            ));
        }
    }
    if !result.timestamp_violations.is_empty() {
        lines.push("Timestamp mismatches beyond tolerance:".to_owned());
        for violation in &result.timestamp_violations {
            lines.push(format!(
                "  - {} expected @ {}, observed {} (delta {:.3}s)",
                violation.expected.describe(),
                format_optional(violation.expected.timestamp_hint),
                format_optional(violation.actual.timestamp),
                violation.delta
            ));
        }
    }
    if lines.is_empty() {
        lines.push(ALL_MATCHED.to_owned());
    }
    lines.join("\n")
}

fn format_stamp(timestamp: Option<f64>) -> String {
    timestamp.map_or_else(|| "@?".to_owned(), |ts| format!("@{ts:.3}s"))
}

// Whole seconds keep their fractional digit: `10.0`, not `10`.
fn format_optional(value: Option<f64>) -> String {
    value.map_or_else(
        || "?".to_owned(),
        |v| serde_json::Number::from_f64(v).map_or_else(|| v.to_string(), |n| n.to_string()),
    )
}

/// Serializable digest of one comparison, written next to the capture for CI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub scenario: String,
    pub ok: bool,
    pub tolerance_secs: f64,
    /// SHA-256 over the console text followed by the metadata bytes.
    pub capture_hash: String,
    pub counts: ComparisonCounts,
    pub missing: Vec<String>,
    pub unexpected: Vec<UnexpectedEntry>,
    pub timestamp_violations: Vec<ViolationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnexpectedEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub timestamp: Option<f64>,
    pub line: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEntry {
    pub expected: String,
    pub timestamp_hint: Option<f64>,
    pub observed: Option<f64>,
    pub delta: f64,
}

impl ComparisonSummary {
    #[must_use]
    pub fn from_result(
        scenario: &str,
        result: &ComparisonResult<'_>,
        tolerance_secs: f64,
        capture_hash: String,
    ) -> Self {
        Self {
            scenario: scenario.to_owned(),
            ok: result.ok(),
            tolerance_secs,
            capture_hash,
            counts: result.counts(),
            missing: result.missing.iter().map(|e| e.describe()).collect(),
            unexpected: result
                .unexpected
                .iter()
                .map(|event| UnexpectedEntry {
                    kind: event.kind.to_string(),
                    text: event.text.clone(),
                    timestamp: event.timestamp,
                    line: event.line(),
                })
                .collect(),
            timestamp_violations: result
                .timestamp_violations
                .iter()
                .map(|violation| ViolationEntry {
                    expected: violation.expected.describe(),
                    timestamp_hint: violation.expected.timestamp_hint,
                    observed: violation.actual.timestamp,
                    delta: violation.delta,
                })
                .collect(),
        }
    }

    /// One-line `key=value` digest for CI logs.
    #[must_use]
    pub fn status_line(&self) -> String {
        let mut line = String::new();
        let _ = write!(
            line,
            "scenario={} ok={} matched={} missing={} unexpected={} timestamp_violations={} capture_hash={}",
            self.scenario,
            self.ok,
            self.counts.matched,
            self.counts.missing,
            self.counts.unexpected,
            self.counts.timestamp_violations,
            self.capture_hash
        );
        line
    }
}
