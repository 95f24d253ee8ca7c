use std::sync::Arc;

use async_trait::async_trait;

use responder_common::retry::{retry_async, RetryPolicy};

use super::channel::{Notifier, NotifyError, StatusUpdate};

/// Retrying decorator around any channel. Exhausted retries surface the
/// last error to the caller, which logs and moves on; notification failure
/// never blocks a workflow.
pub struct RetryNotifier {
    inner: Arc<dyn Notifier>,
    policy: RetryPolicy,
}

impl RetryNotifier {
    pub fn new(inner: Arc<dyn Notifier>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl Notifier for RetryNotifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, update: &StatusUpdate) -> Result<(), NotifyError> {
        retry_async(&self.policy, || self.inner.send(update)).await
    }
}
