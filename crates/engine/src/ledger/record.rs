use serde::{Deserialize, Serialize};

/// Immutable append-only entry. `sequence_number` is monotonic per
/// incident; records are never mutated or deleted except by retention
/// expiry of the whole incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub incident_id: String,
    pub sequence_number: u64,
    pub timestamp_ms: i64,
    pub event_kind: EventKind,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    IncidentReceived,
    ResolvedSignal,
    WorkflowStarted,
    StateChanged,
    ActionAttempted,
    ActionCompleted,
    WorkflowCancelled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncidentReceived => "incident_received",
            Self::ResolvedSignal => "resolved_signal",
            Self::WorkflowStarted => "workflow_started",
            Self::StateChanged => "state_changed",
            Self::ActionAttempted => "action_attempted",
            Self::ActionCompleted => "action_completed",
            Self::WorkflowCancelled => "workflow_cancelled",
        }
    }
}
