use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for the engine parity tooling.
///
/// Only structural problems surface here: unreadable inputs, malformed
/// documents and invalid catalogue entries. Discrepancies between a
/// capture and its expectations are data, not errors, and never reach
/// this type.
#[derive(Error, Debug)]
pub enum ParityError {
    // === I/O Errors ===
    /// An input document could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output document could not be written.
    #[error("failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input document is not valid JSON or does not have the expected shape.
    #[error("malformed document '{path}': {detail}")]
    MalformedDocument { path: PathBuf, detail: String },

    // === Catalogue Errors ===
    /// An expected event carries no match block, or an empty one.
    #[error("expected event '{kind}' is missing a match block")]
    MissingMatchBlock { kind: String },

    /// An expected event carries more than one selector.
    #[error("match block must contain exactly one selector, found {count}")]
    AmbiguousMatchBlock { count: usize },

    /// The selector key is not one of `exact`, `contains` or `regex`.
    #[error("unsupported match type: {selector}")]
    UnsupportedSelector { selector: String },

    /// A `regex` selector does not compile.
    #[error("invalid match pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// The `type` of an expected event names no known event kind.
    #[error("unknown event kind: {kind}")]
    UnknownEventKind { kind: String },

    /// A catalogue scenario entry does not have the scenario shape.
    #[error("malformed scenario '{scenario}': {detail}")]
    MalformedScenario { scenario: String, detail: String },

    /// The requested scenario is absent from the catalogue.
    #[error("scenario '{scenario}' not found in catalogue")]
    ScenarioNotFound { scenario: String },

    // === Internal Errors ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParityError {
    /// Whether this error stems from an invalid catalogue rather than from
    /// unreadable or malformed inputs.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingMatchBlock { .. }
                | Self::MalformedScenario { .. }
                | Self::AmbiguousMatchBlock { .. }
                | Self::UnsupportedSelector { .. }
                | Self::InvalidPattern { .. }
                | Self::UnknownEventKind { .. }
                | Self::ScenarioNotFound { .. }
        )
    }

    /// Process exit code for any error (for CLI use).
    ///
    /// Codes 0 and 1 belong to comparison outcomes.
    pub const EXIT_CODE: u8 = 2;

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ScenarioNotFound { .. } => {
                Some("Run the refresh command against a known-good capture to create the scenario")
            }
            Self::MissingMatchBlock { .. } | Self::AmbiguousMatchBlock { .. } => {
                Some("Give every expected event exactly one of `exact`, `contains` or `regex`")
            }
            Self::InvalidPattern { .. } => Some("Fix the regular expression in the catalogue"),
            Self::MalformedDocument { .. } => Some("Check that the file is valid JSON"),
            _ => None,
        }
    }

    /// Create a malformed-document error.
    pub fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `ParityError`.
pub type Result<T> = std::result::Result<T, ParityError>;
