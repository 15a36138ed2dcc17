//! Error types for configuration, browser navigation and extraction.
//!
//! Nothing in a traversal is retried: every [`ScrapeError`] raised while
//! walking pages aborts the run, and the engine wraps it in a
//! [`TraversalFailure`] that records where the run stopped.

use crate::models::Position;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// A required field was absent from an article's rendered markup.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("no title matched `{primary}` or fallback `{fallback}`")]
    MissingTitle { primary: String, fallback: String },

    #[error("no category matched `{0}`")]
    MissingCategory(String),

    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("element `{locator}` not visible after {timeout:?}")]
    NavigationTimeout { locator: String, timeout: Duration },

    /// Anything the browser or WebDriver service reports.
    #[error("browser session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("resume position {position} is out of bounds: {reason}")]
    OutOfBounds { position: Position, reason: String },

    #[error("traversal has already run")]
    AlreadyRan,
}

impl ScrapeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn session(err: impl std::fmt::Display) -> Self {
        Self::Session(err.to_string())
    }
}

/// A traversal aborted at `position`.
///
/// Output already written stays on disk; restarting with `position` as the
/// resume offsets continues without redoing completed articles.
#[derive(Error, Debug)]
#[error("traversal failed at {position}: {cause}")]
pub struct TraversalFailure {
    pub position: Position,
    #[source]
    pub cause: ScrapeError,
}
