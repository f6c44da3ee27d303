//! Ordering of console and metadata events into one sequence.

use std::cmp::Ordering;

use crate::event::LogEvent;

/// Concatenate console and metadata events and stable-sort them by
/// timestamp. Undated events sort after every dated one and keep their
/// relative order.
#[must_use]
pub fn merge_events(console: Vec<LogEvent>, metadata: Vec<LogEvent>) -> Vec<LogEvent> {
    let mut merged = console;
    merged.extend(metadata);
    merged.sort_by(|a, b| compare_timestamps(a.timestamp, b.timestamp));
    merged
}

fn compare_timestamps(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
