use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Human-readable status change pushed to an external channel. Delivery is
/// at-least-once and must never block the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub incident_id: String,
    pub new_status: String,
    pub summary: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, update: &StatusUpdate) -> Result<(), NotifyError>;
}

#[derive(Debug)]
pub struct NotifyError(pub String);

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "notify: {}", self.0)
    }
}

impl std::error::Error for NotifyError {}
