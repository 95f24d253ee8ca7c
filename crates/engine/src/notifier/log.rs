use async_trait::async_trait;

use super::channel::{Notifier, NotifyError, StatusUpdate};

/// Fallback channel: emits status changes to the structured log. Useful
/// when no external channel is configured; never fails.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, update: &StatusUpdate) -> Result<(), NotifyError> {
        tracing::info!(
            incident_id = %update.incident_id,
            new_status = %update.new_status,
            summary = %update.summary,
            "incident status change"
        );
        Ok(())
    }
}
