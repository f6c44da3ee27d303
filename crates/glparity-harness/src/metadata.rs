//! Run metadata decoding.
//!
//! The launcher writes a JSON sidecar next to the console capture:
//!
//! ```json
//! { "map": "q2dm1", "build": "1.0", "demo": "smoke.dm2",
//!   "score_ticks": [ { "player": "Hunk", "score": 3, "time": 12.5 } ] }
//! ```
//!
//! Each score sample becomes one `score-tick` event.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glparity_error::{ParityError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::event::{EventKind, EventOrigin, LogEvent};

/// One periodic score sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreTick {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ScoreTick {
    /// Console-style rendering: `Score: <player> <score>`.
    #[must_use]
    pub fn render_text(&self) -> String {
        let player = self.player.as_deref().unwrap_or("unknown");
        let score = match &self.score {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => "?".to_owned(),
            Some(other) => other.to_string(),
        };
        format!("Score: {player} {score}")
    }

    /// The raw sample as event attributes.
    #[must_use]
    pub fn to_attributes(&self) -> BTreeMap<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn to_event(&self) -> LogEvent {
        let mut event = LogEvent::new(EventKind::ScoreTick, self.render_text(), EventOrigin::Metadata)
            .with_timestamp(self.time);
        event.attributes = self.to_attributes();
        event
    }
}

/// Sidecar document written by the launcher for each run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo: Option<String>,
    #[serde(default)]
    pub score_ticks: Vec<ScoreTick>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RunMetadata {
    /// Parse a metadata document. `source` names the document in errors.
    pub fn from_json(text: &str, source: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| ParityError::malformed(source, err.to_string()))
    }

    /// Read and parse a metadata document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ParityError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Whether the document carried no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_none()
            && self.build.is_none()
            && self.demo.is_none()
            && self.score_ticks.is_empty()
            && self.extra.is_empty()
    }

    /// One `score-tick` event per sample, in document order.
    #[must_use]
    pub fn events(&self) -> Vec<LogEvent> {
        let events: Vec<LogEvent> = self.score_ticks.iter().map(ScoreTick::to_event).collect();
        debug!(
            map = self.map.as_deref().unwrap_or("<unset>"),
            ticks = events.len(),
            "decoded run metadata"
        );
        events
    }
}
