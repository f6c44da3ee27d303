//! Sequential alignment of expectations against observed events.
//!
//! The alignment is single-pass and never backtracks. A cursor walks the
//! observed sequence; each expectation consumes events until one matches,
//! and everything it skips over is reported as unexpected. An expectation
//! with no match anywhere in the remainder drives the cursor to the end, so
//! every later expectation is reported missing as well, even when a later
//! event would have matched it on its own. Historical verdicts depend on
//! this behaviour; do not replace it with an optimal matching.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::LogEvent;
use crate::expectation::ExpectedEvent;

/// Default tolerance, in seconds, for timestamp hints.
pub const DEFAULT_TIMESTAMP_TOLERANCE_SECS: f64 = 0.75;

/// A matched pair whose timestamp drifted beyond tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampViolation<'a> {
    pub expected: &'a ExpectedEvent,
    pub actual: &'a LogEvent,
    /// Absolute difference between hint and observation, in seconds.
    pub delta: f64,
}

/// Outcome of one diff run. Borrowed from the inputs; never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComparisonResult<'a> {
    pub matched: Vec<(&'a ExpectedEvent, &'a LogEvent)>,
    pub missing: Vec<&'a ExpectedEvent>,
    pub unexpected: Vec<&'a LogEvent>,
    pub timestamp_violations: Vec<TimestampViolation<'a>>,
}

impl ComparisonResult<'_> {
    /// True iff nothing is missing, unexpected, or out of tolerance.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.timestamp_violations.is_empty()
    }

    #[must_use]
    pub fn counts(&self) -> ComparisonCounts {
        ComparisonCounts {
            matched: self.matched.len(),
            missing: self.missing.len(),
            unexpected: self.unexpected.len(),
            timestamp_violations: self.timestamp_violations.len(),
        }
    }
}

/// Sizes of each section of a [`ComparisonResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonCounts {
    pub matched: usize,
    pub missing: usize,
    pub unexpected: usize,
    pub timestamp_violations: usize,
}

/// Align `expected` against `actual`.
///
/// Timestamp hints are only checked when both the hint and the observed
/// timestamp are present; a difference strictly greater than `tolerance`
/// is a violation.
#[must_use]
pub fn diff_events<'a>(
    expected: &'a [ExpectedEvent],
    actual: &'a [LogEvent],
    tolerance: f64,
) -> ComparisonResult<'a> {
    let mut result = ComparisonResult::default();
    let mut cursor = 0_usize;

    for expectation in expected {
        let mut found = false;
        while let Some(candidate) = actual.get(cursor) {
            cursor += 1;
            if expectation.matches(candidate) {
                found = true;
                result.matched.push((expectation, candidate));
                if let (Some(hint), Some(observed)) =
                    (expectation.timestamp_hint, candidate.timestamp)
                {
                    let delta = (hint - observed).abs();
                    if delta > tolerance {
                        result.timestamp_violations.push(TimestampViolation {
                            expected: expectation,
                            actual: candidate,
                            delta,
                        });
                    }
                }
                break;
            }
            result.unexpected.push(candidate);
        }
        if !found {
            result.missing.push(expectation);
        }
    }
    result.unexpected.extend(&actual[cursor..]);

    let counts = result.counts();
    debug!(
        expected = expected.len(),
        actual = actual.len(),
        matched = counts.matched,
        missing = counts.missing,
        unexpected = counts.unexpected,
        timestamp_violations = counts.timestamp_violations,
        "diffed capture against expectations"
    );
    result
}
