//! Error types for cartwheel

use thiserror::Error;

use crate::page::PageError;

/// Result type alias using cartwheel Error
pub type Result<T> = std::result::Result<T, Error>;

/// Harness-level failures. Anything here aborts the whole run; per-step
/// failures live in [`crate::outcome::StepError`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("DevTools endpoint not ready after {seconds}s")]
    DevtoolsTimeout { seconds: u64 },

    #[error("Session error: {0}")]
    Session(#[from] PageError),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
