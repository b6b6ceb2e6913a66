//! Error types shared by the orrery binaries.

use thiserror::Error;

/// Main error type for the orrery runtime.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value could not be parsed or is out of range
    #[error("Config error: {key}: {message}")]
    Config {
        /// Name of the offending setting (environment variable).
        key: String,
        /// Why the value was rejected.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::Config`] for the given key.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type alias using the core [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
