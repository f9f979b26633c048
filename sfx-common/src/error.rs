//! Common error types for the SFX crates

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for SFX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the SFX crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML document could not be parsed into the expected shape
    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Invalid user input (e.g. an unparseable time field)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
