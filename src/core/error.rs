use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the harvesting pipeline.
///
/// Only the input-stage variants (`InputNotFound`, `InvalidInput`, `InvalidUrl`,
/// `BrowserUnavailable`) are meant to abort a run. Everything else is caught
/// by the controller that owns the failing step, logged, and swallowed.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("input file {path} is not a JSON array of records: {source}")]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unusable target URL '{0}' (expected an absolute http(s) URL)")]
    InvalidUrl(String),

    #[error("no Chromium-family browser found; install Chrome/Chromium/Brave or set CHROME_EXECUTABLE")]
    BrowserUnavailable,

    #[error("browser error: {0}")]
    Browser(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("{what} timed out after {}ms", after.as_millis())]
    Timeout { what: String, after: Duration },

    #[error("no element #{index} for selector '{selector}'")]
    ElementNotFound { selector: String, index: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T, E = ScoutError> = std::result::Result<T, E>;
