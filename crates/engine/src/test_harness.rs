//! Fakes for exercising the engine without a real control plane or
//! notification channel. Shared by unit and integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::executor::control_plane::{
    ControlPlane, ControlPlaneError, ControlPlaneErrorKind, ControlPlaneOp, OpReceipt,
};
use crate::executor::token::{ScopedToken, ScopedTokenProvider, TokenError};
use crate::notifier::channel::{Notifier, NotifyError, StatusUpdate};

/// Records every applied operation and can be scripted to fail the next N
/// calls. The call counter is what idempotency tests assert against.
pub struct MockControlPlane {
    ops: Mutex<Vec<ControlPlaneOp>>,
    calls: AtomicU32,
    fail_remaining: AtomicU32,
    fail_retryable: AtomicU32,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            fail_remaining: AtomicU32::new(0),
            fail_retryable: AtomicU32::new(1),
        }
    }

    /// Fail the next `n` apply calls; `retryable` picks the error class.
    pub fn fail_next(&self, n: u32, retryable: bool) {
        self.fail_remaining.store(n, Ordering::SeqCst);
        self.fail_retryable
            .store(if retryable { 1 } else { 0 }, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ops(&self) -> Vec<ControlPlaneOp> {
        self.ops.lock().unwrap().clone()
    }
}

impl Default for MockControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn apply(
        &self,
        op: &ControlPlaneOp,
        _token: &ScopedToken,
    ) -> Result<OpReceipt, ControlPlaneError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            let kind = if self.fail_retryable.load(Ordering::SeqCst) == 1 {
                ControlPlaneErrorKind::Unavailable
            } else {
                ControlPlaneErrorKind::Unauthorized
            };
            return Err(ControlPlaneError::new(kind, "scripted failure"));
        }

        self.ops.lock().unwrap().push(op.clone());
        Ok(OpReceipt {
            reference: format!("mock-op-{call}"),
        })
    }
}

/// Issues fixed tokens without any exchange; for tests only.
pub struct StaticTokenProvider {
    pub ttl_ms: i64,
}

impl Default for StaticTokenProvider {
    fn default() -> Self {
        Self { ttl_ms: 60_000 }
    }
}

#[async_trait]
impl ScopedTokenProvider for StaticTokenProvider {
    async fn issue(&self, scope: &str) -> Result<ScopedToken, TokenError> {
        Ok(ScopedToken {
            token: format!("static-token-for-{scope}"),
            scope: scope.to_string(),
            expires_at_ms: responder_common::time::now_ms() + self.ttl_ms,
        })
    }
}

/// Collects status updates; can be scripted to fail every send.
pub struct CollectingNotifier {
    updates: Mutex<Vec<StatusUpdate>>,
    fail_all: bool,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail_all: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            fail_all: true,
        }
    }

    pub fn updates(&self) -> Vec<StatusUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl Default for CollectingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for CollectingNotifier {
    fn name(&self) -> &str {
        "collecting"
    }

    async fn send(&self, update: &StatusUpdate) -> Result<(), NotifyError> {
        if self.fail_all {
            return Err(NotifyError("collector configured to fail".into()));
        }
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}
