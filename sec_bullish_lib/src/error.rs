//! Error types for the library layer.

use std::fmt;

/// Errors produced by the monitor, wrapping upstream API errors and adding
/// configuration, response-shape, keyword, and persistence failures.
///
/// Severity depends on the variant: `Configuration`, `Keywords`, and
/// `Persistence` abort the run; `Api` fails only the category being fetched;
/// `ResponseShape` is downgraded to "zero records" by the pagination engine.
#[derive(Debug)]
pub enum MonitorError {
    /// Missing or malformed configuration value.
    Configuration(String),
    /// An error from the underlying API client (including exhausted negotiation).
    Api(secapi::Error),
    /// A response body matched none of the known envelopes.
    ResponseShape(secapi::types::ShapeError),
    /// The keyword file could not be parsed or a pattern did not compile.
    Keywords(String),
    /// Ledger or export write failure.
    Persistence(String),
    /// JSON serialization or deserialization failed.
    Serialization(serde_json::Error),
}

impl MonitorError {
    pub(crate) fn persistence(path: &std::path::Path, err: impl fmt::Display) -> Self {
        Self::Persistence(format!("{}: {}", path.display(), err))
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::ResponseShape(e) => write!(f, "Response shape error: {}", e),
            Self::Keywords(msg) => write!(f, "Keyword set error: {}", msg),
            Self::Persistence(msg) => write!(f, "Persistence error: {}", msg),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::ResponseShape(e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<secapi::Error> for MonitorError {
    fn from(e: secapi::Error) -> Self {
        Self::Api(e)
    }
}

impl From<secapi::types::ShapeError> for MonitorError {
    fn from(e: secapi::types::ShapeError) -> Self {
        Self::ResponseShape(e)
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}
