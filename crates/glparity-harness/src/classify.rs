//! Line classification.
//!
//! Each decoded message maps to exactly one [`EventKind`]. The checks run in
//! the order of [`CLASSIFICATION_RULES`] and the first match wins; anything
//! left over is a diagnostic so unexpected lines still surface in reports.
//! Catalogues are generated from this classification, so reordering the
//! table changes which historical captures pass.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::event::EventKind;

/// Product and module names that mark a banner line.
pub const BANNER_TOKENS: [&str; 2] = ["BotLib", "Gladiator"];

/// Character whose unbroken runs form separator banners.
pub const BANNER_DELIMITER: char = '-';

static MAP_LOAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bmap\s*:\s*(?P<map>[A-Za-z0-9_]+)").expect("static"));

static BOT_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbot\s+(?P<name>[A-Za-z0-9_\-]+)\s+(connected|entered the game|joined)")
        .expect("static")
});

static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^score[:\s]+(?P<detail>.*)$").expect("static"));

static DIAGNOSTIC_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(warning|error|aas_|botlib|bridge|console message)").expect("static")
});

static CHAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<speaker>[^:]+):\s*(?P<text>.+)$").expect("static"));

/// One entry of the ordered classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub kind: EventKind,
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

/// Classification checks in evaluation order.
///
/// The diagnostic hint check sits ahead of bot-join: an error line that
/// mentions a bot connecting is a diagnostic, not a join.
pub const CLASSIFICATION_RULES: [ClassificationRule; 6] = [
    ClassificationRule {
        kind: EventKind::Banner,
        name: "banner",
        matches: is_banner,
    },
    ClassificationRule {
        kind: EventKind::MapLoad,
        name: "map-load",
        matches: is_map_load,
    },
    ClassificationRule {
        kind: EventKind::Score,
        name: "score",
        matches: is_score,
    },
    ClassificationRule {
        kind: EventKind::Diagnostic,
        name: "diagnostic-hint",
        matches: has_diagnostic_hint,
    },
    ClassificationRule {
        kind: EventKind::BotJoin,
        name: "bot-join",
        matches: is_bot_join,
    },
    ClassificationRule {
        kind: EventKind::Chat,
        name: "chat",
        matches: is_chat,
    },
];

/// Kind assigned when no rule matches.
pub const FALLBACK_KIND: EventKind = EventKind::Diagnostic;

/// A classified message with its kind-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: EventKind,
    pub attributes: BTreeMap<String, Value>,
}

/// Classify a message. Total and deterministic.
#[must_use]
pub fn classify_message(message: &str) -> EventKind {
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| (rule.matches)(message))
        .map_or(FALLBACK_KIND, |rule| rule.kind)
}

/// Classify a message and extract the attributes for its kind.
#[must_use]
pub fn classify(message: &str) -> Classification {
    let kind = classify_message(message);
    Classification {
        kind,
        attributes: extract_attributes(kind, message),
    }
}

/// Extract the kind-specific attributes of a message: the map name for
/// map-load, the bot name for bot-join, the trailing detail for score and
/// the speaker plus message body for chat.
#[must_use]
pub fn extract_attributes(kind: EventKind, message: &str) -> BTreeMap<String, Value> {
    let mut attributes = BTreeMap::new();
    match kind {
        EventKind::MapLoad => {
            if let Some(caps) = MAP_LOAD.captures(message) {
                attributes.insert("map".to_owned(), Value::from(&caps["map"]));
            }
        }
        EventKind::BotJoin => {
            if let Some(caps) = BOT_JOIN.captures(message) {
                attributes.insert("bot".to_owned(), Value::from(&caps["name"]));
            }
        }
        EventKind::Score => {
            if let Some(caps) = SCORE.captures(message) {
                attributes.insert("detail".to_owned(), Value::from(caps["detail"].trim()));
            }
        }
        EventKind::Chat => {
            if let Some(caps) = CHAT.captures(message) {
                attributes.insert("speaker".to_owned(), Value::from(caps["speaker"].trim()));
                attributes.insert("chat".to_owned(), Value::from(caps["text"].trim()));
            }
        }
        EventKind::Banner | EventKind::ScoreTick | EventKind::Diagnostic => {}
    }
    attributes
}

fn is_banner(message: &str) -> bool {
    BANNER_TOKENS.iter().any(|token| message.contains(token))
        || (!message.is_empty() && message.chars().all(|ch| ch == BANNER_DELIMITER))
}

fn is_map_load(message: &str) -> bool {
    MAP_LOAD.is_match(message)
}

fn is_bot_join(message: &str) -> bool {
    BOT_JOIN.is_match(message)
}

fn is_score(message: &str) -> bool {
    SCORE.is_match(message)
}

fn has_diagnostic_hint(message: &str) -> bool {
    DIAGNOSTIC_HINT.is_match(message)
}

fn is_chat(message: &str) -> bool {
    CHAT.is_match(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_by_product_token() {
        assert_eq!(classify_message("Gladiator 1.0 initialised"), EventKind::Banner);
        assert_eq!(classify_message("==== BotLib v0.96 ===="), EventKind::Banner);
    }

    #[test]
    fn banner_by_delimiter_run() {
        assert_eq!(classify_message("------------"), EventKind::Banner);
        assert_eq!(classify_message("-"), EventKind::Banner);
        assert_ne!(classify_message("--- x ---"), EventKind::Banner);
    }

    #[test]
    fn banner_token_is_case_sensitive() {
        assert_eq!(classify_message("botlib setup failed"), EventKind::Diagnostic);
    }

    #[test]
    fn map_load_with_loose_spacing() {
        assert_eq!(classify_message("map: q2dm1"), EventKind::MapLoad);
        assert_eq!(classify_message("Map : q2dm1"), EventKind::MapLoad);
        assert_eq!(classify_message("MAP:q2dm8"), EventKind::MapLoad);
        let c = classify("loading map : q2dm3");
        assert_eq!(c.kind, EventKind::MapLoad);
        assert_eq!(c.attributes["map"], "q2dm3");
    }

    #[test]
    fn bot_join_variants() {
        for line in [
            "bot hunk connected",
            "Bot Reaper entered the game",
            "bot sarge-2 joined",
        ] {
            assert_eq!(classify_message(line), EventKind::BotJoin, "{line}");
        }
        let c = classify("bot sarge-2 joined");
        assert_eq!(c.attributes["bot"], "sarge-2");
    }

    #[test]
    fn score_lines_capture_detail() {
        let c = classify("Score: Hunk 12");
        assert_eq!(c.kind, EventKind::Score);
        assert_eq!(c.attributes["detail"], "Hunk 12");
        assert_eq!(classify_message("score   reaper 3"), EventKind::Score);
        assert_ne!(classify_message("scoreboard: open"), EventKind::Score);
    }

    #[test]
    fn diagnostic_hints_are_case_insensitive() {
        for line in [
            "WARNING: low memory",
            "Error opening file",
            "AAS_LoadMap failed",
            "bridge: frame sync",
            "Console message dropped",
        ] {
            assert_eq!(classify_message(line), EventKind::Diagnostic, "{line}");
        }
    }

    #[test]
    fn diagnostic_hint_outranks_bot_join() {
        assert_eq!(
            classify_message("ERROR: bot Reaper connected"),
            EventKind::Diagnostic
        );
        assert!(classify("ERROR: bot Reaper connected").attributes.is_empty());
    }

    #[test]
    fn diagnostic_hint_outranks_chat() {
        assert_eq!(classify_message("server: error in frame"), EventKind::Diagnostic);
    }

    #[test]
    fn chat_captures_speaker_and_text() {
        let c = classify("Hunk:  nice shot ");
        assert_eq!(c.kind, EventKind::Chat);
        assert_eq!(c.attributes["speaker"], "Hunk");
        assert_eq!(c.attributes["chat"], "nice shot");
    }

    #[test]
    fn unrecognised_lines_fall_back_to_diagnostic() {
        assert_eq!(classify_message("noise"), EventKind::Diagnostic);
        assert_eq!(classify_message("speaker:"), EventKind::Diagnostic);
    }

    #[test]
    fn rule_table_order_is_stable() {
        let names: Vec<&str> = CLASSIFICATION_RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            vec!["banner", "map-load", "score", "diagnostic-hint", "bot-join", "chat"]
        );
    }
}
