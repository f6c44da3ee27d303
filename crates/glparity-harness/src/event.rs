//! Observed events: the common currency of the decoders, the diff engine and
//! the refresher.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use glparity_error::ParityError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute key recording the 1-based console line an event came from.
pub const LINE_ATTRIBUTE: &str = "line";

/// Attribute key consulted by the refresher for an event's severity label.
pub const SEVERITY_ATTRIBUTE: &str = "severity";

/// Classification of an observed or expected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    /// Startup or identification line.
    Banner,
    /// The server switched to a map.
    MapLoad,
    /// A bot connected to the server.
    BotJoin,
    /// Score line printed on the console.
    Score,
    /// Score sample taken from run metadata.
    ScoreTick,
    /// Player or bot chat.
    Chat,
    /// Warnings, errors, and anything not otherwise recognised.
    Diagnostic,
}

impl EventKind {
    pub const ALL: [Self; 7] = [
        Self::Banner,
        Self::MapLoad,
        Self::BotJoin,
        Self::Score,
        Self::ScoreTick,
        Self::Chat,
        Self::Diagnostic,
    ];

    /// Catalogue spelling of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::MapLoad => "map-load",
            Self::BotJoin => "bot-join",
            Self::Score => "score",
            Self::ScoreTick => "score-tick",
            Self::Chat => "chat",
            Self::Diagnostic => "diagnostic",
        }
    }

    /// Kinds whose text the refresher generalises into a pattern.
    #[must_use]
    pub const fn has_numeric_text(self) -> bool {
        matches!(self, Self::Chat | Self::Score | Self::ScoreTick)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ParityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParityError::UnknownEventKind { kind: s.to_owned() })
    }
}

/// Where an event was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    Console,
    Metadata,
}

impl EventOrigin {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Metadata => "metadata",
        }
    }
}

impl fmt::Display for EventOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observed occurrence in a captured run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Message body with the timestamp token stripped.
    pub text: String,
    /// Seconds since the start of the run; `None` when the line had no
    /// parseable timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(rename = "source")]
    pub origin: EventOrigin,
    /// Kind-specific extras (bot name, map name, speaker, source line).
    #[serde(
        rename = "metadata",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attributes: BTreeMap<String, Value>,
}

impl LogEvent {
    #[must_use]
    pub fn new(kind: EventKind, text: impl Into<String>, origin: EventOrigin) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp: None,
            origin,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Option<f64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// String-valued attribute, if present.
    #[must_use]
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Source line number for console events.
    #[must_use]
    pub fn line(&self) -> Option<u64> {
        self.attributes.get(LINE_ATTRIBUTE).and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_spelling_round_trips_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "frag".parse::<EventKind>().unwrap_err();
        assert!(matches!(err, ParityError::UnknownEventKind { kind } if kind == "frag"));
    }

    #[test]
    fn serde_uses_catalogue_spelling() {
        let json = serde_json::to_string(&EventKind::ScoreTick).unwrap();
        assert_eq!(json, "\"score-tick\"");
        let kind: EventKind = serde_json::from_str("\"map-load\"").unwrap();
        assert_eq!(kind, EventKind::MapLoad);
    }

    #[test]
    fn serialized_event_omits_empty_fields() {
        let event = LogEvent::new(EventKind::Diagnostic, "noise", EventOrigin::Console);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "diagnostic", "text": "noise", "source": "console"})
        );
    }

    #[test]
    fn serialized_event_keeps_timestamp_and_metadata() {
        let event = LogEvent::new(EventKind::BotJoin, "bot hunk connected", EventOrigin::Console)
            .with_timestamp(Some(4.5))
            .with_attribute("bot", "hunk")
            .with_attribute(LINE_ATTRIBUTE, 3);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestamp"], 4.5);
        assert_eq!(json["metadata"]["bot"], "hunk");
        assert_eq!(event.line(), Some(3));
        assert_eq!(event.attribute_str("bot"), Some("hunk"));
    }

    #[test]
    fn only_text_heavy_kinds_are_generalised() {
        let generalised: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|kind| kind.has_numeric_text())
            .collect();
        assert_eq!(
            generalised,
            vec![EventKind::Score, EventKind::ScoreTick, EventKind::Chat]
        );
    }
}
