//! Error types shared across termview.

use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Result type for termview operations.
pub type Result<T> = StdResult<T, Error>;

/// Core error type.
#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    #[error("backend: {0}")]
    /// Terminal backend failure: raw mode, input polling or size queries.
    Backend(String),
    #[error("model: {0}")]
    /// A list model was asked for something it does not have.
    Model(String),
    #[error("busy: {0}")]
    /// A view was already borrowed when dispatch or repaint reached it.
    Busy(String),
    #[error("config: {0}")]
    /// Theme or option loading failure.
    Config(String),
    #[error("invalid: {0}")]
    /// Invalid input error.
    Invalid(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}
