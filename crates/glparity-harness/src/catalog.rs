//! Scenario catalogue persistence.
//!
//! The catalogue is a single JSON document:
//!
//! ```json
//! { "scenarios": { "<id>": { "map": "...", "description": "...", "build": "...",
//!                            "events": [ { "type": "...", "match": { "exact": "..." } } ] } } }
//! ```
//!
//! It is loaded once per invocation and passed by reference. Scenario
//! entries are held as raw JSON and only parsed into [`Scenario`] when
//! read, so a refresh of one scenario leaves every other entry exactly as
//! it was written. Only the refresher writes the catalogue back, always
//! with sorted keys and a trailing newline so regenerated catalogues diff
//! cleanly.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use glparity_error::{ParityError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::expectation::{ExpectedEvent, ExpectedEventSpec};

/// Scenario key holding the ordered expectations.
pub const EVENTS_KEY: &str = "events";

/// One named scenario: descriptive fields plus its ordered expectations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default)]
    pub events: Vec<ExpectedEventSpec>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Scenario {
    /// Parse the raw catalogue entry of scenario `id`.
    pub fn from_value(id: &str, raw: &Value) -> Result<Self> {
        Self::deserialize(raw).map_err(|err| ParityError::MalformedScenario {
            scenario: id.to_owned(),
            detail: err.to_string(),
        })
    }

    /// Validate every expectation of this scenario.
    pub fn expected_events(&self) -> Result<Vec<ExpectedEvent>> {
        self.events.iter().map(ExpectedEvent::from_spec).collect()
    }
}

/// The persisted collection of all scenarios.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub scenarios: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Catalog {
    /// Parse a catalogue document. `source` names the document in errors.
    pub fn from_json(text: &str, source: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| ParityError::malformed(source, err.to_string()))
    }

    /// Read and parse the catalogue at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ParityError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&text, path)?;
        debug!(
            path = %path.display(),
            scenarios = catalog.scenarios.len(),
            "loaded catalogue"
        );
        Ok(catalog)
    }

    /// Render the canonical document: sorted keys, two-space indentation,
    /// trailing newline.
    pub fn to_canonical_json(&self) -> Result<String> {
        // Round-tripping through `Value` sorts every object's keys.
        let value = serde_json::to_value(self)
            .map_err(|err| ParityError::internal(format!("failed to serialize catalogue: {err}")))?;
        let mut text = serde_json::to_string_pretty(&value)
            .map_err(|err| ParityError::internal(format!("failed to serialize catalogue: {err}")))?;
        text.push('\n');
        Ok(text)
    }

    /// Write the canonical document to `path`, replacing its contents.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_canonical_json()?;
        fs::write(path, text).map_err(|source| ParityError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            path = %path.display(),
            scenarios = self.scenarios.len(),
            "catalogue written"
        );
        Ok(())
    }

    /// Parsed scenario `id`.
    pub fn scenario(&self, id: &str) -> Result<Scenario> {
        let raw = self
            .scenarios
            .get(id)
            .ok_or_else(|| ParityError::ScenarioNotFound {
                scenario: id.to_owned(),
            })?;
        Scenario::from_value(id, raw)
    }

    /// Validated expectations of scenario `id`.
    pub fn expected_events(&self, id: &str) -> Result<Vec<ExpectedEvent>> {
        self.scenario(id)?.expected_events()
    }

    /// Raw entry of scenario `id`, created empty if absent.
    pub fn scenario_entry(&mut self, id: &str) -> Result<&mut Map<String, Value>> {
        self.scenarios
            .entry(id.to_owned())
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| ParityError::MalformedScenario {
                scenario: id.to_owned(),
                detail: "expected a JSON object".to_owned(),
            })
    }
}
