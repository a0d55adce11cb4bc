//! Report delivery.
//!
//! The actual channel (mail, chat) lives outside this crate; all it needs
//! to offer is `send(subject, body)`.

use tracing::info;

use super::error::NotifyError;

/// A channel that can deliver a rendered report.
pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> impl Future<Output = Result<(), NotifyError>>;
}

/// Notifier that writes the report to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(subject, bytes = body.len(), "Report ready");
        Ok(())
    }
}
