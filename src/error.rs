//! Error types for the Slack callback service

use std::io;

use thiserror::Error;

/// Result type alias for the Slack callback service
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
///
/// These cover startup, configuration and server failures. Failures of the
/// token exchange itself never surface here; they are turned into redirects
/// (see [`crate::slack::ExchangeOutcome`]).
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}
