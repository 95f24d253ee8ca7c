pub mod config_store;
pub mod control_plane;
pub mod token;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use config_store::{degraded_flag_key, ConfigStore};
use control_plane::{ControlPlane, ControlPlaneOp, ResourceRef};
use token::{ScopedToken, ScopedTokenProvider};

/// Closed set of remediation verbs a policy can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Degrade,
    Scale,
    Restart,
    Drain,
}

impl ActionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "degrade" => Some(Self::Degrade),
            "scale" => Some(Self::Scale),
            "restart" => Some(Self::Restart),
            "drain" => Some(Self::Drain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degrade => "degrade",
            Self::Scale => "scale",
            Self::Restart => "restart",
            Self::Drain => "drain",
        }
    }
}

/// One entry of a ranked remediation plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedAction {
    pub kind: ActionKind,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecOutcome {
    Succeeded {
        external_reference: Option<String>,
    },
    Failed {
        reason: String,
        retryable: bool,
    },
}

impl ExecOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Invokes remediation operations against the external control plane,
/// idempotently per key: a key already recorded as completed short-circuits
/// to the prior outcome without re-invoking anything.
pub struct ActionExecutor {
    control_plane: Arc<dyn ControlPlane>,
    tokens: Arc<dyn ScopedTokenProvider>,
    config_store: Arc<dyn ConfigStore>,
    completed: DashMap<String, ExecOutcome>,
    call_timeout: Duration,
}

impl ActionExecutor {
    pub fn new(
        control_plane: Arc<dyn ControlPlane>,
        tokens: Arc<dyn ScopedTokenProvider>,
        config_store: Arc<dyn ConfigStore>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            control_plane,
            tokens,
            config_store,
            completed: DashMap::new(),
            call_timeout,
        }
    }

    pub async fn execute(
        &self,
        action: &PlannedAction,
        idempotency_key: &str,
        target: &ResourceRef,
    ) -> ExecOutcome {
        if let Some(prior) = self.completed.get(idempotency_key) {
            tracing::debug!(
                idempotency_key,
                action = action.kind.as_str(),
                "idempotency key already completed, returning recorded outcome"
            );
            return prior.clone();
        }

        let outcome = self.run(action, target).await;
        self.completed
            .insert(idempotency_key.to_string(), outcome.clone());
        outcome
    }

    async fn run(&self, action: &PlannedAction, target: &ResourceRef) -> ExecOutcome {
        // Scoped credential per invocation; never reused across attempts.
        let token = match self.tokens.issue(&target.scope()).await {
            Ok(t) => t,
            Err(e) => {
                return ExecOutcome::Failed {
                    reason: e.to_string(),
                    retryable: false,
                }
            }
        };

        match action.kind {
            ActionKind::Degrade => {
                let flag = degraded_flag_key(&target.namespace, &target.name);
                if let Err(e) = self.config_store.put(&flag, "true").await {
                    return ExecOutcome::Failed {
                        reason: e.to_string(),
                        retryable: true,
                    };
                }
                let env = ControlPlaneOp::EnsureEnv {
                    target: target.clone(),
                    name: "DEGRADED_MODE".into(),
                    value: "true".into(),
                };
                match self.apply(&env, &token).await {
                    Ok(_) => {}
                    Err(out) => return out,
                }
                let restart = ControlPlaneOp::RestartMarker {
                    target: target.clone(),
                    restarted_at: chrono::Utc::now().to_rfc3339(),
                };
                match self.apply(&restart, &token).await {
                    Ok(receipt) => ExecOutcome::Succeeded {
                        external_reference: Some(receipt),
                    },
                    Err(out) => out,
                }
            }
            ActionKind::Scale => {
                let replicas = action
                    .parameters
                    .get("desired_replicas")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(4) as u32;
                let op = ControlPlaneOp::EnsureReplicas {
                    target: target.clone(),
                    replicas,
                };
                match self.apply(&op, &token).await {
                    Ok(receipt) => ExecOutcome::Succeeded {
                        external_reference: Some(receipt),
                    },
                    Err(out) => out,
                }
            }
            ActionKind::Restart => {
                let op = ControlPlaneOp::RestartMarker {
                    target: target.clone(),
                    restarted_at: chrono::Utc::now().to_rfc3339(),
                };
                match self.apply(&op, &token).await {
                    Ok(receipt) => ExecOutcome::Succeeded {
                        external_reference: Some(receipt),
                    },
                    Err(out) => out,
                }
            }
            ActionKind::Drain => {
                let op = ControlPlaneOp::Drain {
                    target: target.clone(),
                };
                match self.apply(&op, &token).await {
                    Ok(receipt) => ExecOutcome::Succeeded {
                        external_reference: Some(receipt),
                    },
                    Err(out) => out,
                }
            }
        }
    }

    async fn apply(
        &self,
        op: &ControlPlaneOp,
        token: &ScopedToken,
    ) -> Result<String, ExecOutcome> {
        match tokio::time::timeout(self.call_timeout, self.control_plane.apply(op, token)).await {
            Ok(Ok(receipt)) => Ok(receipt.reference),
            Ok(Err(e)) => Err(ExecOutcome::Failed {
                retryable: e.retryable(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ExecOutcome::Failed {
                reason: format!("control plane call exceeded {:?}", self.call_timeout),
                retryable: true,
            }),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }
}
