use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use responder_common::retry::RetryPolicy;
use responder_common::time::now_ms;

use super::policy::RemediationPolicy;
use super::state::{transition, WorkflowEvent, WorkflowExecution, WorkflowState};
use crate::executor::control_plane::ResourceRef;
use crate::executor::{ActionExecutor, ExecOutcome};
use crate::incident::model::Incident;
use crate::ledger::{EventKind, Ledger};
use crate::metrics::EngineMetrics;
use crate::notifier::channel::{Notifier, StatusUpdate};

/// External inputs to a running workflow, delivered through its mailbox.
#[derive(Debug, Clone)]
pub enum WorkflowSignal {
    /// A `resolved` delivery for the fingerprint, or an external health
    /// check confirming recovery.
    RecoveryObserved,
    /// Operator override; aborts automation and escalates.
    Cancel { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyActive,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Per-action attempt budget for retryable executor failures.
    pub max_attempts: u32,
    pub attempt_backoff: RetryPolicy,
    pub stabilization_window: Duration,
    /// Namespace remediations target; the workload name comes from the
    /// incident's `service` label.
    pub default_namespace: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_backoff: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_secs(1),
                max_delay: Duration::from_secs(30),
                jitter_fraction: 0.1,
            },
            stabilization_window: Duration::from_secs(60),
            default_namespace: "apps".into(),
        }
    }
}

/// Drives each incident occurrence from detection to a terminal
/// disposition. One actor task per active incident is the single writer of
/// that incident's execution state; the active-set entry enforces at most
/// one open execution per incident id.
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    ledger: Arc<Ledger>,
    executor: Arc<ActionExecutor>,
    policy: RemediationPolicy,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<EngineMetrics>,
    cfg: WorkflowConfig,
    active: DashMap<String, mpsc::UnboundedSender<WorkflowSignal>>,
}

impl Orchestrator {
    pub fn new(
        ledger: Arc<Ledger>,
        executor: Arc<ActionExecutor>,
        policy: RemediationPolicy,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<EngineMetrics>,
        cfg: WorkflowConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                ledger,
                executor,
                policy,
                notifier,
                metrics,
                cfg,
                active: DashMap::new(),
            }),
        }
    }

    /// Start a workflow for a firing occurrence. Duplicate starts while an
    /// execution is open are rejected here, not by callers.
    pub fn start(&self, incident: Incident) -> StartOutcome {
        let incident_id = incident.incident_id.clone();

        match self.inner.active.entry(incident_id.clone()) {
            Entry::Occupied(_) => StartOutcome::AlreadyActive,
            Entry::Vacant(vacant) => {
                let started_at = now_ms();
                if !self
                    .inner
                    .ledger
                    .open_execution(WorkflowExecution::new(incident_id.clone(), started_at))
                {
                    return StartOutcome::AlreadyActive;
                }

                self.inner.ledger.append(
                    &incident_id,
                    started_at,
                    EventKind::WorkflowStarted,
                    serde_json::json!({
                        "alertname": incident.alert_name(),
                        "severity": incident.severity.as_str(),
                    }),
                );

                let (tx, rx) = mpsc::unbounded_channel();
                vacant.insert(tx);
                self.inner.metrics.inc_workflows_started();

                let inner = self.inner.clone();
                tokio::spawn(run_workflow(inner, incident, rx));
                StartOutcome::Started
            }
        }
    }

    /// Route a recovery observation (resolved delivery or health signal)
    /// to the active workflow, if any.
    pub fn observe_recovery(&self, incident_id: &str) -> bool {
        match self.inner.active.get(incident_id) {
            Some(tx) => tx.send(WorkflowSignal::RecoveryObserved).is_ok(),
            None => false,
        }
    }

    /// Operator override. True when an active workflow received the
    /// cancellation.
    pub fn cancel(&self, incident_id: &str, reason: &str) -> bool {
        match self.inner.active.get(incident_id) {
            Some(tx) => tx
                .send(WorkflowSignal::Cancel {
                    reason: reason.to_string(),
                })
                .is_ok(),
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.len()
    }
}

/// Outcome of a cancellable wait.
enum WaitOutcome {
    Elapsed,
    Recovered,
    Cancelled(String),
}

async fn run_workflow(
    inner: Arc<Inner>,
    incident: Incident,
    mut rx: mpsc::UnboundedReceiver<WorkflowSignal>,
) {
    let incident_id = incident.incident_id.clone();
    let mut state = WorkflowState::Received;
    let mut recovery_seen = false;
    let mut total_attempts: u32 = 0;

    state = advance(&inner, &incident_id, state, &WorkflowEvent::Start, None);

    let plan = inner.policy.plan(&incident);
    if plan.is_empty() {
        state = advance(
            &inner,
            &incident_id,
            state,
            &WorkflowEvent::PolicyMissed,
            Some("no matching remediation policy or severity below threshold"),
        );
        finish(&inner, &incident, state, total_attempts, "no automated remediation applies");
        return;
    }
    state = advance(&inner, &incident_id, state, &WorkflowEvent::PolicyMatched, None);

    let target = ResourceRef {
        namespace: inner.cfg.default_namespace.clone(),
        name: incident.service().to_string(),
    };

    let mut action_idx = 0;
    loop {
        // Remediating: drive the current ranked action with its own
        // attempt budget.
        let action = &plan[action_idx];
        let mut action_attempts: u32 = 0;

        loop {
            total_attempts += 1;
            action_attempts += 1;
            inner
                .ledger
                .update_execution(&incident_id, |e| e.attempt_count = total_attempts);

            let idempotency_key = format!("{incident_id}:{total_attempts}");
            inner.ledger.append(
                &incident_id,
                now_ms(),
                EventKind::ActionAttempted,
                serde_json::json!({
                    "action_kind": action.kind.as_str(),
                    "attempt": total_attempts,
                    "idempotency_key": idempotency_key,
                    "input_parameters": action.parameters,
                }),
            );
            inner.metrics.inc_actions_attempted();

            let outcome = inner.executor.execute(action, &idempotency_key, &target).await;
            inner.ledger.append(
                &incident_id,
                now_ms(),
                EventKind::ActionCompleted,
                serde_json::json!({
                    "action_kind": action.kind.as_str(),
                    "attempt": total_attempts,
                    "outcome": outcome,
                }),
            );

            match outcome {
                ExecOutcome::Succeeded { .. } => {
                    state = advance(&inner, &incident_id, state, &WorkflowEvent::AttemptSucceeded, None);
                    break;
                }
                ExecOutcome::Failed { reason, retryable } => {
                    inner.metrics.inc_actions_failed();
                    inner.ledger.update_execution(&incident_id, |e| {
                        e.last_error = Some(reason.clone());
                    });

                    if !retryable {
                        state = advance(
                            &inner,
                            &incident_id,
                            state,
                            &WorkflowEvent::AttemptFailedFatal,
                            Some(&reason),
                        );
                        finish(&inner, &incident, state, total_attempts, &reason);
                        return;
                    }

                    let attempts_left = action_attempts < inner.cfg.max_attempts;
                    state = advance(
                        &inner,
                        &incident_id,
                        state,
                        &WorkflowEvent::AttemptFailed { attempts_left },
                        Some(&reason),
                    );
                    if !attempts_left {
                        finish(&inner, &incident, state, total_attempts, &reason);
                        return;
                    }

                    let delay = inner.cfg.attempt_backoff.delay_for(action_attempts);
                    match wait(&mut rx, delay, &mut recovery_seen).await {
                        WaitOutcome::Elapsed | WaitOutcome::Recovered => {}
                        WaitOutcome::Cancelled(why) => {
                            state = cancel_to_escalated(&inner, &incident_id, state, &why);
                            finish(&inner, &incident, state, total_attempts, &why);
                            return;
                        }
                    }
                }
            }
        }

        // Verifying: wait for recovery inside the stabilization window.
        if recovery_seen {
            state = advance(&inner, &incident_id, state, &WorkflowEvent::RecoveryObserved, None);
            finish(&inner, &incident, state, total_attempts, "recovery observed");
            return;
        }

        match wait(&mut rx, inner.cfg.stabilization_window, &mut recovery_seen).await {
            WaitOutcome::Recovered => {
                state = advance(&inner, &incident_id, state, &WorkflowEvent::RecoveryObserved, None);
                finish(&inner, &incident, state, total_attempts, "recovery observed");
                return;
            }
            WaitOutcome::Cancelled(why) => {
                state = cancel_to_escalated(&inner, &incident_id, state, &why);
                finish(&inner, &incident, state, total_attempts, &why);
                return;
            }
            WaitOutcome::Elapsed => {
                action_idx += 1;
                let actions_left = action_idx < plan.len();
                state = advance(
                    &inner,
                    &incident_id,
                    state,
                    &WorkflowEvent::StabilizationTimeout { actions_left },
                    Some("no recovery inside stabilization window"),
                );
                if !actions_left {
                    finish(
                        &inner,
                        &incident,
                        state,
                        total_attempts,
                        "verification timed out and the action plan is exhausted",
                    );
                    return;
                }
            }
        }
    }
}

/// Log-then-act: append the transition to the ledger and update the
/// projection before the new state's work begins.
fn advance(
    inner: &Arc<Inner>,
    incident_id: &str,
    state: WorkflowState,
    event: &WorkflowEvent,
    reason: Option<&str>,
) -> WorkflowState {
    let Some(next) = transition(state, event) else {
        tracing::error!(
            incident_id,
            from = state.as_str(),
            ?event,
            "illegal workflow transition ignored"
        );
        return state;
    };

    let mut payload = serde_json::json!({
        "from": state.as_str(),
        "to": next.as_str(),
    });
    if let Some(r) = reason {
        payload["reason"] = serde_json::Value::String(r.to_string());
    }
    inner
        .ledger
        .append(incident_id, now_ms(), EventKind::StateChanged, payload);
    inner.ledger.update_execution(incident_id, |e| e.state = next);

    tracing::info!(
        incident_id,
        from = state.as_str(),
        to = next.as_str(),
        "workflow transition"
    );
    next
}

fn cancel_to_escalated(
    inner: &Arc<Inner>,
    incident_id: &str,
    state: WorkflowState,
    reason: &str,
) -> WorkflowState {
    inner.ledger.append(
        incident_id,
        now_ms(),
        EventKind::WorkflowCancelled,
        serde_json::json!({ "reason": reason }),
    );
    advance(inner, incident_id, state, &WorkflowEvent::Cancelled, Some(reason))
}

/// Cancellable, recovery-aware sleep. Recovery observations during a
/// backoff are remembered and consumed on entry to verification.
async fn wait(
    rx: &mut mpsc::UnboundedReceiver<WorkflowSignal>,
    duration: Duration,
    recovery_seen: &mut bool,
) -> WaitOutcome {
    let deadline = tokio::time::Instant::now() + duration;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(WorkflowSignal::RecoveryObserved)) => {
                *recovery_seen = true;
                return WaitOutcome::Recovered;
            }
            Ok(Some(WorkflowSignal::Cancel { reason })) => {
                return WaitOutcome::Cancelled(reason);
            }
            // The orchestrator's active-set entry holds the sender; a
            // closed channel means shutdown, treated as elapsed.
            Ok(None) => return WaitOutcome::Elapsed,
            Err(_) => return WaitOutcome::Elapsed,
        }
    }
}

fn finish(
    inner: &Arc<Inner>,
    incident: &Incident,
    state: WorkflowState,
    total_attempts: u32,
    disposition: &str,
) {
    let incident_id = &incident.incident_id;
    let terminal_at = now_ms();
    inner.ledger.update_execution(incident_id, |e| {
        e.terminal_at_ms = Some(terminal_at);
    });
    inner.active.remove(incident_id);

    match state {
        WorkflowState::Resolved => inner.metrics.inc_workflows_resolved(),
        WorkflowState::Failed => inner.metrics.inc_workflows_failed(),
        WorkflowState::Escalated => inner.metrics.inc_workflows_escalated(),
        _ => {
            tracing::error!(incident_id, state = state.as_str(), "finish on non-terminal state");
        }
    }
    tracing::info!(
        incident_id,
        state = state.as_str(),
        attempts = total_attempts,
        disposition,
        "workflow terminal"
    );

    let update = StatusUpdate {
        incident_id: incident_id.clone(),
        new_status: state.as_str().to_string(),
        summary: format!("{}: {disposition} (attempts: {total_attempts})", incident.summary()),
    };
    let notifier = inner.notifier.clone();
    let metrics = inner.metrics.clone();
    tokio::spawn(async move {
        match notifier.send(&update).await {
            Ok(()) => metrics.inc_notifications_sent(),
            Err(e) => {
                metrics.inc_notifications_failed();
                tracing::warn!(
                    incident_id = %update.incident_id,
                    error = %e,
                    "terminal status notification failed"
                );
            }
        }
    });
}
