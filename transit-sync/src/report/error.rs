//! Report error types.

use std::path::PathBuf;

/// Errors persisting or rendering a run report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Report file could not be written
    #[error("report I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize the report
    #[error("report JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Markdown template failed to render
    #[error("report template error: {0}")]
    Render(#[from] askama::Error),
}

/// Errors delivering a report through a notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The channel rejected or failed to deliver the message
    #[error("notification failed: {0}")]
    Delivery(String),
}
