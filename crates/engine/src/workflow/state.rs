use serde::{Deserialize, Serialize};

/// Closed state set for one incident occurrence. Transitions are a pure
/// function over (state, event) so the machine is testable without timers
/// or I/O; the orchestrator supplies both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Received,
    Evaluating,
    Remediating,
    Verifying,
    Resolved,
    Failed,
    Escalated,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Failed | Self::Escalated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Evaluating => "evaluating",
            Self::Remediating => "remediating",
            Self::Verifying => "verifying",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
            Self::Escalated => "escalated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Start,
    /// Policy produced a non-empty ranked action plan.
    PolicyMatched,
    /// No rule matched, or severity sits below the auto-remediation
    /// threshold.
    PolicyMissed,
    AttemptSucceeded,
    /// Retryable failure; `attempts_left` is false once the per-action
    /// budget is spent.
    AttemptFailed { attempts_left: bool },
    /// Non-retryable failure (unsafe to re-apply).
    AttemptFailedFatal,
    RecoveryObserved,
    /// Stabilization window elapsed; `actions_left` is false once the
    /// ranked plan is exhausted.
    StabilizationTimeout { actions_left: bool },
    Cancelled,
}

/// Legal transitions; `None` for anything else. Cancellation wins from any
/// non-terminal state; terminal states accept nothing.
pub fn transition(state: WorkflowState, event: &WorkflowEvent) -> Option<WorkflowState> {
    use WorkflowEvent as E;
    use WorkflowState as S;

    if state.is_terminal() {
        return None;
    }
    if matches!(event, E::Cancelled) {
        return Some(S::Escalated);
    }

    match (state, event) {
        (S::Received, E::Start) => Some(S::Evaluating),

        (S::Evaluating, E::PolicyMatched) => Some(S::Remediating),
        (S::Evaluating, E::PolicyMissed) => Some(S::Escalated),

        (S::Remediating, E::AttemptSucceeded) => Some(S::Verifying),
        (S::Remediating, E::AttemptFailed { attempts_left: true }) => Some(S::Remediating),
        (S::Remediating, E::AttemptFailed { attempts_left: false }) => Some(S::Failed),
        (S::Remediating, E::AttemptFailedFatal) => Some(S::Escalated),

        (S::Verifying, E::RecoveryObserved) => Some(S::Resolved),
        (S::Verifying, E::StabilizationTimeout { actions_left: true }) => Some(S::Remediating),
        (S::Verifying, E::StabilizationTimeout { actions_left: false }) => Some(S::Escalated),

        _ => None,
    }
}

/// One execution per incident occurrence; mutated only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowExecution {
    pub incident_id: String,
    pub state: WorkflowState,
    pub attempt_count: u32,
    pub last_error: Option<String>,
    pub started_at_ms: i64,
    pub terminal_at_ms: Option<i64>,
}

impl WorkflowExecution {
    pub fn new(incident_id: String, started_at_ms: i64) -> Self {
        Self {
            incident_id,
            state: WorkflowState::Received,
            attempt_count: 0,
            last_error: None,
            started_at_ms,
            terminal_at_ms: None,
        }
    }

    pub fn is_open(&self) -> bool {
        !self.state.is_terminal()
    }
}
