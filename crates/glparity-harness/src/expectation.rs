//! Catalogue expectations.
//!
//! [`ExpectedEventSpec`] is the document form stored in the catalogue;
//! [`ExpectedEvent`] is the validated form the diff engine consumes. The
//! conversion happens once, at load time, so a malformed match block fails
//! before any matching is attempted.

use std::collections::BTreeMap;
use std::fmt;

use glparity_error::{ParityError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{EventKind, LogEvent};

pub const EXACT_SELECTOR: &str = "exact";
pub const CONTAINS_SELECTOR: &str = "contains";
pub const REGEX_SELECTOR: &str = "regex";

/// How an expectation recognises the text of an event.
#[derive(Debug, Clone)]
pub enum MatchSelector {
    /// Literal equality.
    Exact(String),
    /// Substring presence.
    Contains(String),
    /// Unanchored regular expression search.
    Pattern(Regex),
}

impl MatchSelector {
    /// Resolve a `match` block. Exactly one selector key must be present.
    pub fn from_block(kind: &str, block: Option<&BTreeMap<String, Value>>) -> Result<Self> {
        let block = match block {
            Some(block) if !block.is_empty() => block,
            _ => {
                return Err(ParityError::MissingMatchBlock {
                    kind: kind.to_owned(),
                });
            }
        };
        if block.len() != 1 {
            return Err(ParityError::AmbiguousMatchBlock { count: block.len() });
        }
        let Some((selector, value)) = block.iter().next() else {
            return Err(ParityError::internal("match block emptied during validation"));
        };
        let value = selector_value(value);
        match selector.as_str() {
            EXACT_SELECTOR => Ok(Self::Exact(value)),
            CONTAINS_SELECTOR => Ok(Self::Contains(value)),
            REGEX_SELECTOR => Regex::new(&value).map(Self::Pattern).map_err(|err| {
                ParityError::InvalidPattern {
                    pattern: value.clone(),
                    detail: err.to_string(),
                }
            }),
            other => Err(ParityError::UnsupportedSelector {
                selector: other.to_owned(),
            }),
        }
    }

    /// Catalogue key of this selector.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Exact(_) => EXACT_SELECTOR,
            Self::Contains(_) => CONTAINS_SELECTOR,
            Self::Pattern(_) => REGEX_SELECTOR,
        }
    }

    /// Selector operand as written in the catalogue.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Exact(value) | Self::Contains(value) => value,
            Self::Pattern(regex) => regex.as_str(),
        }
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Exact(value) => text == value,
            Self::Contains(value) => text.contains(value.as_str()),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }

    /// Document form of this selector.
    #[must_use]
    pub fn to_block(&self) -> BTreeMap<String, Value> {
        BTreeMap::from([(self.key().to_owned(), Value::from(self.value()))])
    }
}

impl PartialEq for MatchSelector {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key() && self.value() == other.value()
    }
}

fn selector_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn default_kind() -> String {
    EventKind::Diagnostic.as_str().to_owned()
}

/// One expected event as stored in the catalogue document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedEventSpec {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_hint: Option<f64>,
    /// Provenance note written by the refresher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A validated expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedEvent {
    pub kind: EventKind,
    pub selector: MatchSelector,
    /// Informational only; never consulted when matching.
    pub severity: Option<String>,
    pub timestamp_hint: Option<f64>,
}

impl ExpectedEvent {
    #[must_use]
    pub fn new(kind: EventKind, selector: MatchSelector) -> Self {
        Self {
            kind,
            selector,
            severity: None,
            timestamp_hint: None,
        }
    }

    #[must_use]
    pub fn with_timestamp_hint(mut self, hint: Option<f64>) -> Self {
        self.timestamp_hint = hint;
        self
    }

    /// Validate a catalogue entry.
    pub fn from_spec(spec: &ExpectedEventSpec) -> Result<Self> {
        let selector = MatchSelector::from_block(&spec.kind, spec.selector.as_ref())?;
        let kind = spec.kind.parse::<EventKind>()?;
        Ok(Self {
            kind,
            selector,
            severity: spec.severity.clone(),
            timestamp_hint: spec.timestamp_hint,
        })
    }

    /// Kinds must agree, then the selector decides on the event text.
    #[must_use]
    pub fn matches(&self, event: &LogEvent) -> bool {
        self.kind == event.kind && self.selector.is_match(&event.text)
    }

    /// One-line description used in reports.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ExpectedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}={}]",
            self.kind,
            self.selector.key(),
            quote_value(self.selector.value())
        )
    }
}

/// Quote a selector value for reports. Single quotes are used unless the
/// value holds a single quote and no double quote. Backslashes and control
/// characters are escaped.
#[must_use]
pub fn quote_value(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ if ch == quote => {
                quoted.push('\\');
                quoted.push(ch);
            }
            _ if ch.is_control() => {
                let code = u32::from(ch);
                let escaped = if code < 0x100 {
                    format!("\\x{code:02x}")
                } else {
                    format!("\\u{code:04x}")
                };
                quoted.push_str(&escaped);
            }
            _ => quoted.push(ch),
        }
    }
    quoted.push(quote);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventOrigin;

    fn spec(json: &str) -> ExpectedEventSpec {
        serde_json::from_str(json).unwrap()
    }

    fn event(kind: EventKind, text: &str) -> LogEvent {
        LogEvent::new(kind, text, EventOrigin::Console)
    }

    #[test]
    fn exact_requires_literal_equality() {
        let expected = ExpectedEvent::from_spec(&spec(
            r#"{"type": "map-load", "match": {"exact": "map: q2dm1"}}"#,
        ))
        .unwrap();
        assert!(expected.matches(&event(EventKind::MapLoad, "map: q2dm1")));
        assert!(!expected.matches(&event(EventKind::MapLoad, "map: q2dm1 ")));
    }

    #[test]
    fn contains_requires_substring() {
        let expected =
            ExpectedEvent::from_spec(&spec(r#"{"type": "chat", "match": {"contains": "hello"}}"#))
                .unwrap();
        assert!(expected.matches(&event(EventKind::Chat, "Hunk: hello there")));
        assert!(!expected.matches(&event(EventKind::Chat, "Hunk: bye")));
    }

    #[test]
    fn regex_is_unanchored_search() {
        let expected = ExpectedEvent::from_spec(&spec(
            r#"{"type": "score", "match": {"regex": "Hunk \\d+"}}"#,
        ))
        .unwrap();
        assert!(expected.matches(&event(EventKind::Score, "Score: Hunk 12 (lead)")));
        assert!(!expected.matches(&event(EventKind::Score, "Score: Reaper 12")));
    }

    #[test]
    fn kind_must_agree() {
        let expected = ExpectedEvent::new(EventKind::BotJoin, MatchSelector::Contains(String::new()));
        assert!(!expected.matches(&event(EventKind::Diagnostic, "bot hunk connected")));
        assert!(expected.matches(&event(EventKind::BotJoin, "bot hunk connected")));
    }

    #[test]
    fn type_defaults_to_diagnostic() {
        let expected =
            ExpectedEvent::from_spec(&spec(r#"{"match": {"contains": "noise"}}"#)).unwrap();
        assert_eq!(expected.kind, EventKind::Diagnostic);
    }

    #[test]
    fn missing_or_empty_match_block_is_rejected() {
        for json in [
            r#"{"type": "chat"}"#,
            r#"{"type": "chat", "match": {}}"#,
            r#"{"type": "chat", "match": null}"#,
        ] {
            let err = ExpectedEvent::from_spec(&spec(json)).unwrap_err();
            assert!(
                matches!(err, ParityError::MissingMatchBlock { ref kind } if kind == "chat"),
                "{json}: {err}"
            );
        }
    }

    #[test]
    fn multiple_selectors_are_rejected() {
        let err = ExpectedEvent::from_spec(&spec(
            r#"{"type": "chat", "match": {"exact": "a", "contains": "a"}}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ParityError::AmbiguousMatchBlock { count: 2 }));
    }

    #[test]
    fn unsupported_selector_is_rejected_at_load() {
        let err =
            ExpectedEvent::from_spec(&spec(r#"{"type": "chat", "match": {"glob": "a*"}}"#))
                .unwrap_err();
        assert!(matches!(err, ParityError::UnsupportedSelector { selector } if selector == "glob"));
    }

    #[test]
    fn invalid_pattern_is_rejected_at_load() {
        let err =
            ExpectedEvent::from_spec(&spec(r#"{"type": "chat", "match": {"regex": "(unclosed"}}"#))
                .unwrap_err();
        assert!(matches!(err, ParityError::InvalidPattern { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err =
            ExpectedEvent::from_spec(&spec(r#"{"type": "frag", "match": {"exact": "x"}}"#))
                .unwrap_err();
        assert!(matches!(err, ParityError::UnknownEventKind { .. }));
    }

    #[test]
    fn non_string_operands_are_stringified() {
        let expected =
            ExpectedEvent::from_spec(&spec(r#"{"type": "score", "match": {"contains": 12}}"#))
                .unwrap();
        assert_eq!(expected.selector, MatchSelector::Contains("12".to_owned()));
    }

    #[test]
    fn hint_and_severity_are_carried() {
        let expected = ExpectedEvent::from_spec(&spec(
            r#"{"type": "banner", "match": {"exact": "x"}, "severity": "info", "timestamp_hint": 1.25}"#,
        ))
        .unwrap();
        assert_eq!(expected.severity.as_deref(), Some("info"));
        assert_eq!(expected.timestamp_hint, Some(1.25));
    }

    #[test]
    fn describe_names_kind_and_selector() {
        let expected =
            ExpectedEvent::new(EventKind::MapLoad, MatchSelector::Exact("map: q2dm1".to_owned()));
        assert_eq!(expected.describe(), "map-load [exact='map: q2dm1']");
    }

    #[test]
    fn quoting_picks_the_quote_the_value_lacks() {
        assert_eq!(quote_value("map: q2dm1"), "'map: q2dm1'");
        assert_eq!(quote_value("Hunk's frag"), r#""Hunk's frag""#);
        assert_eq!(quote_value(r#"say "it's""#), r#"'say "it\'s"'"#);
        assert_eq!(quote_value(r"Hunk: \d+"), r"'Hunk: \\d+'");
        assert_eq!(quote_value("a\tb\u{1}"), r"'a\tb\x01'");
    }

    #[test]
    fn selector_block_round_trips() {
        let selector = MatchSelector::from_block(
            "chat",
            Some(&BTreeMap::from([(
                "regex".to_owned(),
                Value::from(r"Hunk: \d+"),
            )])),
        )
        .unwrap();
        assert_eq!(selector.to_block()["regex"], r"Hunk: \d+");
    }
}
