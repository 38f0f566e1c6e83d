//! Error types shared across the sentinel crates.
//!
//! The detector itself never fails; these errors only surface at the
//! boundaries (loading configuration, opening the line log, serving HTTP).

use thiserror::Error;

/// Result alias for sentinel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by sentinel I/O boundaries
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP server failure
    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// Build a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
