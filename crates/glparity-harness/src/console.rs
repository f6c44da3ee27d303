//! Console capture decoding.

use tracing::debug;

use crate::classify::classify;
use crate::event::{EventOrigin, LINE_ATTRIBUTE, LogEvent};
use crate::timestamp::{parse_timestamp, split_timestamp_prefix};

/// Whether `ch` ends a console line. A bare carriage return ends one too.
const fn is_line_boundary(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split console text into lines. `\r\n` is one boundary and a trailing
/// boundary does not open an empty final line.
#[must_use]
pub fn split_console_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if !is_line_boundary(ch) {
            continue;
        }
        lines.push(&text[start..index]);
        start = index + ch.len_utf8();
        if ch == '\r' && chars.peek().is_some_and(|&(_, next)| next == '\n') {
            chars.next();
            start += 1;
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Decode captured console text into events, one per non-blank line.
///
/// Each event records its 1-based source line under the `line` attribute;
/// blank lines are skipped but still counted.
#[must_use]
pub fn parse_console_output(text: &str, origin: EventOrigin) -> Vec<LogEvent> {
    let mut events = Vec::new();
    for (index, raw_line) in split_console_lines(text).into_iter().enumerate() {
        let line = raw_line.trim_end();
        if line.is_empty() {
            continue;
        }
        let split = split_timestamp_prefix(line);
        let classification = classify(split.message);
        let mut event = LogEvent::new(classification.kind, split.message, origin)
            .with_timestamp(parse_timestamp(split.token));
        event.attributes = classification.attributes;
        event
            .attributes
            .insert(LINE_ATTRIBUTE.to_owned(), (index + 1).into());
        events.push(event);
    }
    debug!(
        origin = %origin,
        events = events.len(),
        "decoded console capture"
    );
    events
}
