//! Console timestamp tokens.
//!
//! Captured lines carry an optional prefix such as `[0:01:02.500]` or a bare
//! `1:02.500` followed by whitespace. Tokens are colon-delimited and summed
//! left to right (`H:MM:SS.mmm`, `MM:SS.mmm` or `SS.mmm`).

use std::sync::LazyLock;

use regex::Regex;

static TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\[(?P<bracket>[0-9:.]+)\]|(?P<plain>[0-9]+:[0-9:.]+))\s*(?P<message>.*)$",
    )
    .expect("static")
});

/// A console line split into its timestamp token and message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLine<'a> {
    /// Raw token, without brackets. `None` when the line has no prefix.
    pub token: Option<&'a str>,
    /// Message body with the prefix removed.
    pub message: &'a str,
}

/// Split a console line into its timestamp token and message.
///
/// Lines without a recognised prefix come back unchanged with no token. When
/// a prefix is present the message is trimmed on both sides.
#[must_use]
pub fn split_timestamp_prefix(line: &str) -> SplitLine<'_> {
    let Some(caps) = TIMESTAMP_PREFIX.captures(line) else {
        return SplitLine {
            token: None,
            message: line,
        };
    };
    let token = caps
        .name("bracket")
        .or_else(|| caps.name("plain"))
        .map(|m| m.as_str());
    let message = caps.name("message").map_or("", |m| m.as_str().trim());
    SplitLine { token, message }
}

/// Convert a timestamp token into seconds.
///
/// Returns `None` for absent, blank or unparseable tokens; malformed numeric
/// text is treated as "no timestamp", never as an error.
#[must_use]
pub fn parse_timestamp(token: Option<&str>) -> Option<f64> {
    let token = token?.trim();
    if token.is_empty() {
        return None;
    }
    if !token.contains(':') {
        return parse_part(token);
    }
    let mut seconds = 0.0_f64;
    for part in token.split(':') {
        if part.is_empty() {
            continue;
        }
        seconds = seconds * 60.0 + parse_part(part)?;
    }
    Some(seconds)
}

fn parse_part(part: &str) -> Option<f64> {
    part.parse::<f64>().ok().filter(|value| value.is_finite())
}
