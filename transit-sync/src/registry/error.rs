//! Registry error types.

use std::path::PathBuf;

use crate::domain::LineId;

/// Errors that make a registry document unusable.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registry file could not be read or written
    #[error("registry I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registry document is not valid JSON or has the wrong shape
    #[error("malformed registry {city}: {message}")]
    Malformed { city: String, message: String },

    /// Two lines share an id
    #[error("duplicate line id {0}")]
    DuplicateLine(LineId),

    /// A table refers to a line the registry does not define
    #[error("manual coordinates reference unknown line {0}")]
    UnknownLine(LineId),

    /// City name cannot be used as a file stem
    #[error("invalid city name {0:?}")]
    InvalidCity(String),
}
