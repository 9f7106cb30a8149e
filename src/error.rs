//! Error types for searches, extraction, sessions and configuration.
//!
//! Only [`SearchError`] ever reaches a caller of the engine. Extraction
//! failures are recovered per source inside the engine and show up in the
//! logs, never in the result of a search.

use std::time::Duration;
use thiserror::Error;

/// Hard failures of a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The requested career is not part of the catalog.
    #[error("unknown career '{category}'")]
    InvalidQuery {
        category: String,
        available: Vec<&'static str>,
    },

    /// The shared scraping session could not be opened.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Failure of a single source extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Transport-level failure while talking to the source.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The source answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    /// The source did not answer within its request timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The page could not be interpreted.
    #[error("could not parse page: {0}")]
    Parse(String),

    /// The overall search deadline ran out before this source finished.
    #[error("search deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl ExtractionError {
    /// Classify a reqwest error for `url`, keeping timeouts distinct.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExtractionError::Timeout {
                url: url.to_string(),
            }
        } else {
            ExtractionError::Http {
                url: url.to_string(),
                source: err,
            }
        }
    }
}

/// Failure to acquire the shared scraping session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The HTTP client backing the session could not be built.
    #[error("could not build HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    /// Any other launch failure reported by a session factory.
    #[error("could not launch session: {0}")]
    Launch(String),
}

/// Failure to load engine settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
