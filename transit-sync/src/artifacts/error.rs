//! Artifact error types.

use std::path::PathBuf;

/// Errors reading or writing a city's artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// Filesystem operation failed
    #[error("artifact I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to (de)serialize a JSON document
    #[error("artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to parse a GeoJSON document
    #[error("artifact GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A document parsed but does not have the expected shape
    #[error("invalid {what}: {message}")]
    Invalid { what: &'static str, message: String },
}

impl ArtifactError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(what: &'static str, message: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            what,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ArtifactError::invalid("route feature", "missing geometry");
        assert_eq!(err.to_string(), "invalid route feature: missing geometry");

        let err = ArtifactError::io(
            "/data/nyc/lines.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().starts_with("artifact I/O error at /data/nyc/lines.json"));
    }
}
