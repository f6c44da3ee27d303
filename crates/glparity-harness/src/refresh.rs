//! Golden refresh: regenerate a scenario's expectations from a known-good
//! capture.
//!
//! Chat and score text is generalised so that numbers may vary between
//! runs: decimals become `\d+(?:\.\d+)?`, remaining integers become `\d+`,
//! and everything else is escaped literally. Other kinds keep their text
//! verbatim as an exact selector. Digits embedded in names are generalised
//! too (`bot2` matches `bot7`); existing catalogues rely on that.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use glparity_error::{ParityError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::info;

use crate::catalog::{Catalog, EVENTS_KEY};
use crate::event::{LogEvent, SEVERITY_ATTRIBUTE};
use crate::expectation::{ExpectedEventSpec, MatchSelector};
use crate::metadata::RunMetadata;

/// Fragment substituted for decimal literals.
pub const FLOAT_FRAGMENT: &str = r"\d+(?:\.\d+)?";

/// Fragment substituted for integer literals.
pub const INT_FRAGMENT: &str = r"\d+";

// Decimal alternative first so an integer never splits a fraction.
static NUMERIC_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<float>\d+\.\d+)|(?P<int>\d+)").expect("static"));

/// Generalise numeric literals in `text` into a regular expression that
/// still matches `text` itself.
#[must_use]
pub fn generalize_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for caps in NUMERIC_LITERAL.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        pattern.push_str(&regex::escape(&text[last..whole.start()]));
        if caps.name("float").is_some() {
            pattern.push_str(FLOAT_FRAGMENT);
        } else {
            pattern.push_str(INT_FRAGMENT);
        }
        last = whole.end();
    }
    pattern.push_str(&regex::escape(&text[last..]));
    pattern
}

/// Selector the refresher writes for `event`.
pub fn selector_for(event: &LogEvent) -> Result<MatchSelector> {
    if event.kind.has_numeric_text() {
        let pattern = generalize_pattern(&event.text);
        Regex::new(&pattern).map(MatchSelector::Pattern).map_err(|err| {
            ParityError::InvalidPattern {
                pattern,
                detail: err.to_string(),
            }
        })
    } else {
        Ok(MatchSelector::Exact(event.text.clone()))
    }
}

/// Convert a captured sequence into catalogue expectations, one per event.
pub fn build_expected_block(events: &[LogEvent]) -> Result<Vec<ExpectedEventSpec>> {
    events
        .iter()
        .map(|event| {
            let selector = selector_for(event)?;
            Ok(ExpectedEventSpec {
                kind: event.kind.as_str().to_owned(),
                selector: Some(selector.to_block()),
                severity: event.attribute_str(SEVERITY_ATTRIBUTE).map(str::to_owned),
                timestamp_hint: event.timestamp,
                source: Some(format!("refreshed from {}", event.origin)),
                extra: BTreeMap::new(),
            })
        })
        .collect()
}

/// Replace the expectations of `scenario_id` with the captured sequence.
///
/// Descriptive fields are filled from the run metadata only when the
/// scenario does not already carry them, and not at all when the metadata
/// document is empty. Other scenarios are untouched.
pub fn refresh_scenario(
    catalog: &mut Catalog,
    scenario_id: &str,
    events: &[LogEvent],
    metadata: &RunMetadata,
) -> Result<usize> {
    let block = build_expected_block(events)?;
    let count = block.len();
    let block = serde_json::to_value(block)
        .map_err(|err| ParityError::internal(format!("failed to serialize expectations: {err}")))?;
    let entry = catalog.scenario_entry(scenario_id)?;
    if !metadata.is_empty() {
        fill_descriptive_fields(entry, metadata);
    }
    entry.insert(EVENTS_KEY.to_owned(), block);
    info!(
        scenario = scenario_id,
        events = count,
        "scenario refreshed from capture"
    );
    Ok(count)
}

fn fill_descriptive_fields(entry: &mut Map<String, Value>, metadata: &RunMetadata) {
    if let Some(map) = &metadata.map {
        entry
            .entry("map")
            .or_insert_with(|| Value::from(map.as_str()));
    }
    entry.entry("description").or_insert_with(|| {
        let demo = metadata.demo.as_deref().unwrap_or("capture");
        Value::from(format!("Refreshed from {demo}"))
    });
    if let Some(build) = &metadata.build {
        entry
            .entry("build")
            .or_insert_with(|| Value::from(build.as_str()));
    }
}

/// Whether a refreshed expectation still matches the event it came from.
#[must_use]
pub fn selector_round_trips(event: &LogEvent) -> bool {
    selector_for(event).is_ok_and(|selector| selector.is_match(&event.text))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::event::{EventKind, EventOrigin};

    fn event(kind: EventKind, text: &str) -> LogEvent {
        LogEvent::new(kind, text, EventOrigin::Console)
    }

    #[test]
    fn decimals_are_replaced_before_integers() {
        assert_eq!(
            generalize_pattern("Score: Hunk 12.5"),
            r"Score: Hunk \d+(?:\.\d+)?"
        );
        assert_eq!(generalize_pattern("Score: Hunk 12"), r"Score: Hunk \d+");
        assert_eq!(
            generalize_pattern("1.2.3"),
            r"\d+(?:\.\d+)?\.\d+"
        );
    }

    #[test]
    fn literal_text_is_escaped() {
        assert_eq!(
            generalize_pattern("Hunk: (gg) 3+1?"),
            r"Hunk: \(gg\) \d+\+\d+\?"
        );
    }

    #[test]
    fn identifiers_lose_their_digits() {
        let pattern = generalize_pattern("bot2: hi");
        assert_eq!(pattern, r"bot\d+: hi");
        assert!(Regex::new(&pattern).unwrap().is_match("bot7: hi"));
    }

    #[test]
    fn generated_patterns_match_their_source() {
        for text in ["Score: Hunk 12", "Reaper: 3.25 frags/min", "Score: unknown ?"] {
            assert!(selector_round_trips(&event(EventKind::Chat, text)), "{text}");
        }
    }

    #[test]
    fn numeric_kinds_become_patterns_others_stay_exact() {
        let events = vec![
            event(EventKind::MapLoad, "map: q2dm1"),
            event(EventKind::Chat, "Hunk: 2 frags"),
            event(EventKind::ScoreTick, "Score: Hunk 3"),
            event(EventKind::Diagnostic, "warning 12"),
        ];
        let block = build_expected_block(&events).unwrap();
        let selectors: Vec<(String, Value)> = block
            .iter()
            .map(|spec| {
                let (key, value) = spec.selector.as_ref().unwrap().iter().next().unwrap();
                (key.clone(), value.clone())
            })
            .collect();
        assert_eq!(
            selectors,
            vec![
                ("exact".to_owned(), Value::from("map: q2dm1")),
                ("regex".to_owned(), Value::from(r"Hunk: \d+ frags")),
                ("regex".to_owned(), Value::from(r"Score: Hunk \d+")),
                ("exact".to_owned(), Value::from("warning 12")),
            ]
        );
    }

    #[test]
    fn block_carries_hint_severity_and_source() {
        let mut tick = LogEvent::new(EventKind::ScoreTick, "Score: Hunk 3", EventOrigin::Metadata)
            .with_timestamp(Some(12.5))
            .with_attribute(SEVERITY_ATTRIBUTE, "info");
        tick.attributes.insert("player".to_owned(), Value::from("Hunk"));
        let block = build_expected_block(&[tick]).unwrap();
        assert_eq!(block[0].kind, "score-tick");
        assert_eq!(block[0].timestamp_hint, Some(12.5));
        assert_eq!(block[0].severity.as_deref(), Some("info"));
        assert_eq!(block[0].source.as_deref(), Some("refreshed from metadata"));
    }

    #[test]
    fn refresh_fills_descriptive_fields_once() {
        let mut catalog = Catalog::default();
        let metadata = RunMetadata {
            map: Some("q2dm1".to_owned()),
            build: Some("1.0".to_owned()),
            demo: Some("smoke.dm2".to_owned()),
            ..RunMetadata::default()
        };
        let events = vec![event(EventKind::MapLoad, "map: q2dm1")];
        assert_eq!(refresh_scenario(&mut catalog, "smoke", &events, &metadata).unwrap(), 1);
        let scenario = catalog.scenario("smoke").unwrap();
        assert_eq!(scenario.map.as_deref(), Some("q2dm1"));
        assert_eq!(scenario.build.as_deref(), Some("1.0"));
        assert_eq!(scenario.description.as_deref(), Some("Refreshed from smoke.dm2"));

        let other = RunMetadata {
            map: Some("q2dm8".to_owned()),
            ..RunMetadata::default()
        };
        refresh_scenario(&mut catalog, "smoke", &events, &other).unwrap();
        let scenario = catalog.scenario("smoke").unwrap();
        assert_eq!(scenario.map.as_deref(), Some("q2dm1"));
        assert_eq!(scenario.description.as_deref(), Some("Refreshed from smoke.dm2"));
    }

    #[test]
    fn description_defaults_to_capture() {
        let mut catalog = Catalog::default();
        let metadata = RunMetadata {
            map: Some("q2dm1".to_owned()),
            ..RunMetadata::default()
        };
        refresh_scenario(&mut catalog, "bare", &[], &metadata).unwrap();
        let scenario = catalog.scenario("bare").unwrap();
        assert_eq!(scenario.description.as_deref(), Some("Refreshed from capture"));
        assert_eq!(scenario.build, None);
        assert!(scenario.events.is_empty());
    }

    #[test]
    fn empty_metadata_leaves_descriptive_fields_alone() {
        let mut catalog = Catalog::default();
        let events = vec![event(EventKind::MapLoad, "map: q2dm1")];
        refresh_scenario(&mut catalog, "bare", &events, &RunMetadata::default()).unwrap();
        let scenario = catalog.scenario("bare").unwrap();
        assert_eq!(scenario.description, None);
        assert_eq!(scenario.map, None);
        assert_eq!(scenario.events.len(), 1);
        assert_eq!(
            catalog.scenarios["bare"].as_object().map(|entry| entry.len()),
            Some(1)
        );
    }

    #[test]
    fn refresh_keeps_unrelated_keys_of_the_scenario() {
        let mut catalog = Catalog::default();
        catalog
            .scenario_entry("smoke")
            .unwrap()
            .insert("owner".to_owned(), Value::from("qa"));
        refresh_scenario(&mut catalog, "smoke", &[], &RunMetadata::default()).unwrap();
        assert_eq!(catalog.scenarios["smoke"]["owner"], "qa");
    }

    #[test]
    fn refreshed_block_loads_back_as_expectations() {
        let events = vec![
            event(EventKind::Banner, "Gladiator 1.0"),
            event(EventKind::Score, "Score: Hunk 12.5"),
        ];
        let mut catalog = Catalog::default();
        refresh_scenario(&mut catalog, "s", &events, &RunMetadata::default()).unwrap();
        let expected = catalog.expected_events("s").unwrap();
        for (expectation, event) in expected.iter().zip(&events) {
            assert!(expectation.matches(event));
        }
    }
}
