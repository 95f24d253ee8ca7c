use dashmap::DashMap;
use serde::Serialize;

use super::record::{AuditRecord, EventKind};
use crate::incident::coalesce::OpenExecutions;
use crate::incident::model::Incident;
use crate::workflow::state::{WorkflowExecution, WorkflowState};

/// Single source of truth for incident and execution state. Append-then-
/// project: every write appends an audit record and updates the projection
/// inside one map-entry lock, so writers for the same incident are
/// serialized and writers for different incidents never contend.
pub struct Ledger {
    entries: DashMap<String, Entry>,
}

struct Entry {
    incident: Option<Incident>,
    execution: Option<WorkflowExecution>,
    records: Vec<AuditRecord>,
    next_seq: u64,
}

impl Entry {
    fn new() -> Self {
        Self {
            incident: None,
            execution: None,
            records: Vec::new(),
            next_seq: 0,
        }
    }
}

/// Point-lookup view: current execution plus the full audit sequence.
#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub incident: Option<Incident>,
    pub execution: Option<WorkflowExecution>,
    pub records: Vec<AuditRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentSummary {
    pub incident_id: String,
    pub alert_name: String,
    pub severity: String,
    pub state: Option<WorkflowState>,
    pub record_count: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Append an audit record, returning its sequence number.
    pub fn append(
        &self,
        incident_id: &str,
        timestamp_ms: i64,
        event_kind: EventKind,
        payload: serde_json::Value,
    ) -> u64 {
        let mut entry = self
            .entries
            .entry(incident_id.to_string())
            .or_insert_with(Entry::new);
        let seq = entry.next_seq;
        entry.next_seq += 1;
        entry.records.push(AuditRecord {
            incident_id: incident_id.to_string(),
            sequence_number: seq,
            timestamp_ms,
            event_kind,
            payload,
        });
        seq
    }

    /// Record the canonical incident alongside an `incident_received` or
    /// `resolved_signal` audit record. The first firing wins; later
    /// deliveries only append.
    pub fn record_incident(&self, incident: &Incident) -> u64 {
        let kind = match incident.status {
            crate::incident::model::IncidentStatus::Firing => EventKind::IncidentReceived,
            crate::incident::model::IncidentStatus::Resolved => EventKind::ResolvedSignal,
        };
        let payload = serde_json::to_value(incident).unwrap_or_default();

        let mut entry = self
            .entries
            .entry(incident.incident_id.clone())
            .or_insert_with(Entry::new);
        if entry.incident.is_none() {
            entry.incident = Some(incident.clone());
        }
        let seq = entry.next_seq;
        entry.next_seq += 1;
        entry.records.push(AuditRecord {
            incident_id: incident.incident_id.clone(),
            sequence_number: seq,
            timestamp_ms: incident.received_at_ms,
            event_kind: kind,
            payload,
        });
        seq
    }

    /// Install a fresh execution for the incident. Returns false when an
    /// open execution already exists (the caller must not start another).
    pub fn open_execution(&self, execution: WorkflowExecution) -> bool {
        let mut entry = self
            .entries
            .entry(execution.incident_id.clone())
            .or_insert_with(Entry::new);
        if entry.execution.as_ref().is_some_and(|e| e.is_open()) {
            return false;
        }
        entry.execution = Some(execution);
        true
    }

    /// Mutate the current execution under the entry lock.
    pub fn update_execution(&self, incident_id: &str, f: impl FnOnce(&mut WorkflowExecution)) {
        if let Some(mut entry) = self.entries.get_mut(incident_id) {
            if let Some(exec) = entry.execution.as_mut() {
                f(exec);
            }
        }
    }

    pub fn execution(&self, incident_id: &str) -> Option<WorkflowExecution> {
        self.entries
            .get(incident_id)
            .and_then(|e| e.execution.clone())
    }

    pub fn projection(&self, incident_id: &str) -> Option<Projection> {
        self.entries.get(incident_id).map(|e| Projection {
            incident: e.incident.clone(),
            execution: e.execution.clone(),
            records: e.records.clone(),
        })
    }

    pub fn list(&self) -> Vec<IncidentSummary> {
        let mut out: Vec<IncidentSummary> = self
            .entries
            .iter()
            .map(|e| IncidentSummary {
                incident_id: e.key().clone(),
                alert_name: e
                    .value()
                    .incident
                    .as_ref()
                    .map(|i| i.alert_name().to_string())
                    .unwrap_or_default(),
                severity: e
                    .value()
                    .incident
                    .as_ref()
                    .map(|i| i.severity.as_str().to_string())
                    .unwrap_or_default(),
                state: e.value().execution.as_ref().map(|x| x.state),
                record_count: e.value().records.len(),
            })
            .collect();
        out.sort_by(|a, b| a.incident_id.cmp(&b.incident_id));
        out
    }

    /// Drop incidents whose execution went terminal before the retention
    /// cutoff. Open executions are never archived.
    pub fn archive_expired(&self, cutoff_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| match &entry.execution {
            Some(exec) => match exec.terminal_at_ms {
                Some(t) => t >= cutoff_ms,
                None => true,
            },
            None => true,
        });
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenExecutions for Ledger {
    fn has_open_execution(&self, incident_id: &str) -> bool {
        self.entries
            .get(incident_id)
            .and_then(|e| e.execution.as_ref().map(|x| x.is_open()))
            .unwrap_or(false)
    }
}
