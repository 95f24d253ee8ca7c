use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use super::coalesce::{Coalescer, FiringDecision, OpenExecutions};
use super::fingerprint;
use super::model::{Incident, IncidentStatus, Severity};

/// Declared wire shape of an ingestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Alertmanager webhook: `{"alerts": [{status, labels, annotations}]}`,
    /// possibly grouping several occurrences per delivery.
    Alertmanager,
    /// Flat single-alert JSON: `{name, severity, status?, labels?, annotations?}`.
    Generic,
}

impl SourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "alertmanager" => Some(Self::Alertmanager),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ValidationError {
    InvalidPayload(String),
    MissingAlertName,
    InvalidSeverity(String),
}

impl ValidationError {
    /// Stable machine-readable code for the ingestion endpoint.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::MissingAlertName => "MISSING_ALERT_NAME",
            Self::InvalidSeverity(_) => "INVALID_SEVERITY",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPayload(e) => write!(f, "invalid payload: {e}"),
            Self::MissingAlertName => write!(f, "alert name label is required"),
            Self::InvalidSeverity(s) => {
                write!(f, "severity {s:?} is not one of info|warning|critical")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of one ingestion request: emitted incidents plus how many
/// deliveries the coalescer swallowed, so every delivery is accounted for.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub incidents: Vec<Incident>,
    pub suppressed: usize,
    pub dropped_resolved: usize,
}

#[derive(Debug, Deserialize)]
struct AlertmanagerPayload {
    alerts: Vec<RawAlert>,
}

#[derive(Debug, Deserialize)]
struct RawAlert {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct GenericPayload {
    name: Option<String>,
    severity: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
    #[serde(default)]
    annotations: HashMap<String, String>,
}

pub struct Normalizer {
    coalescer: Coalescer,
    open_executions: Arc<dyn OpenExecutions>,
}

impl Normalizer {
    pub fn new(coalescing_window_ms: i64, open_executions: Arc<dyn OpenExecutions>) -> Self {
        Self {
            coalescer: Coalescer::new(coalescing_window_ms),
            open_executions,
        }
    }

    /// Validate and convert one raw delivery into canonical incidents.
    /// Pure apart from the coalescing marker; does not start workflows.
    pub fn normalize(
        &self,
        raw: &[u8],
        source: SourceKind,
        now_ms: i64,
    ) -> Result<NormalizedBatch, ValidationError> {
        let raw_alerts = match source {
            SourceKind::Alertmanager => {
                let payload: AlertmanagerPayload = serde_json::from_slice(raw)
                    .map_err(|e| ValidationError::InvalidPayload(e.to_string()))?;
                payload.alerts
            }
            SourceKind::Generic => {
                let payload: GenericPayload = serde_json::from_slice(raw)
                    .map_err(|e| ValidationError::InvalidPayload(e.to_string()))?;
                let name = payload.name.ok_or(ValidationError::MissingAlertName)?;
                let mut labels = payload.labels;
                labels.insert("alertname".into(), name);
                if let Some(sev) = payload.severity {
                    labels.insert("severity".into(), sev);
                }
                vec![RawAlert {
                    status: payload.status,
                    labels,
                    annotations: payload.annotations,
                }]
            }
        };

        let mut batch = NormalizedBatch::default();

        for alert in raw_alerts {
            let incident = self.convert(alert, now_ms)?;

            match incident.status {
                IncidentStatus::Firing => {
                    match self.coalescer.observe_firing(&incident.fingerprint, now_ms) {
                        FiringDecision::Emit => batch.incidents.push(incident),
                        FiringDecision::Suppress => {
                            tracing::debug!(
                                incident_id = %incident.incident_id,
                                fingerprint = %incident.fingerprint,
                                "duplicate firing suppressed inside coalescing window"
                            );
                            batch.suppressed += 1;
                        }
                    }
                }
                IncidentStatus::Resolved => {
                    if self.open_executions.has_open_execution(&incident.incident_id) {
                        self.coalescer.clear(&incident.fingerprint);
                        batch.incidents.push(incident);
                    } else {
                        tracing::debug!(
                            incident_id = %incident.incident_id,
                            "resolved delivery with no open execution dropped"
                        );
                        batch.dropped_resolved += 1;
                    }
                }
            }
        }

        Ok(batch)
    }

    /// Drop coalescing markers not refreshed since the cutoff.
    pub fn evict_markers(&self, cutoff_ms: i64) {
        self.coalescer.evict_older_than(cutoff_ms);
    }

    fn convert(&self, alert: RawAlert, now_ms: i64) -> Result<Incident, ValidationError> {
        let alert_name = alert
            .labels
            .get("alertname")
            .filter(|n| !n.is_empty())
            .ok_or(ValidationError::MissingAlertName)?
            .clone();

        let severity_raw = alert
            .labels
            .get("severity")
            .ok_or_else(|| ValidationError::InvalidSeverity("<missing>".into()))?;
        let severity = Severity::parse(severity_raw)
            .ok_or_else(|| ValidationError::InvalidSeverity(severity_raw.clone()))?;

        let status = match alert.status.as_deref() {
            None | Some("firing") => IncidentStatus::Firing,
            Some("resolved") => IncidentStatus::Resolved,
            Some(other) => {
                return Err(ValidationError::InvalidPayload(format!(
                    "unknown alert status {other:?}"
                )))
            }
        };

        let fp = fingerprint::compute(&alert_name, &alert.labels);
        Ok(Incident {
            incident_id: fingerprint::incident_id(&fp),
            fingerprint: fp,
            status,
            severity,
            labels: alert.labels,
            annotations: alert.annotations,
            received_at_ms: now_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoOpen;
    impl OpenExecutions for NoOpen {
        fn has_open_execution(&self, _incident_id: &str) -> bool {
            false
        }
    }

    struct AlwaysOpen;
    impl OpenExecutions for AlwaysOpen {
        fn has_open_execution(&self, _incident_id: &str) -> bool {
            true
        }
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(10_000, Arc::new(NoOpen))
    }

    fn firing_payload(alertname: &str, severity: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "alerts": [{
                "status": "firing",
                "labels": {"alertname": alertname, "severity": severity, "service": "checkout"},
                "annotations": {"summary": "checkout is unhappy"}
            }]
        }))
        .unwrap()
    }

    #[test]
    fn valid_alertmanager_payload() {
        let n = normalizer();
        let batch = n
            .normalize(
                &firing_payload("CheckoutHighErrorRate", "critical"),
                SourceKind::Alertmanager,
                1_000,
            )
            .unwrap();
        assert_eq!(batch.incidents.len(), 1);
        let inc = &batch.incidents[0];
        assert_eq!(inc.alert_name(), "CheckoutHighErrorRate");
        assert_eq!(inc.severity, Severity::Critical);
        assert_eq!(inc.status, IncidentStatus::Firing);
        assert!(inc.incident_id.starts_with("inc-"));
    }

    #[test]
    fn malformed_json_rejected() {
        let err = normalizer()
            .normalize(b"{not json", SourceKind::Alertmanager, 1_000)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PAYLOAD");
    }

    #[test]
    fn missing_alertname_rejected() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "alerts": [{"status": "firing", "labels": {"severity": "critical"}}]
        }))
        .unwrap();
        let err = normalizer()
            .normalize(&payload, SourceKind::Alertmanager, 1_000)
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_ALERT_NAME");
    }

    #[test]
    fn unknown_severity_rejected() {
        let err = normalizer()
            .normalize(
                &firing_payload("CheckoutDown", "ticket"),
                SourceKind::Alertmanager,
                1_000,
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SEVERITY");
    }

    #[test]
    fn repeated_firing_coalesced() {
        let n = normalizer();
        let payload = firing_payload("CheckoutDown", "critical");
        let first = n.normalize(&payload, SourceKind::Alertmanager, 1_000).unwrap();
        let second = n.normalize(&payload, SourceKind::Alertmanager, 3_000).unwrap();
        assert_eq!(first.incidents.len(), 1);
        assert!(second.incidents.is_empty());
        assert_eq!(second.suppressed, 1);
    }

    #[test]
    fn resolved_without_open_execution_dropped() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "alerts": [{
                "status": "resolved",
                "labels": {"alertname": "CheckoutDown", "severity": "critical"}
            }]
        }))
        .unwrap();
        let batch = normalizer()
            .normalize(&payload, SourceKind::Alertmanager, 1_000)
            .unwrap();
        assert!(batch.incidents.is_empty());
        assert_eq!(batch.dropped_resolved, 1);
    }

    #[test]
    fn resolved_with_open_execution_passes() {
        let n = Normalizer::new(10_000, Arc::new(AlwaysOpen));
        let payload = serde_json::to_vec(&serde_json::json!({
            "alerts": [{
                "status": "resolved",
                "labels": {"alertname": "CheckoutDown", "severity": "critical"}
            }]
        }))
        .unwrap();
        let batch = n.normalize(&payload, SourceKind::Alertmanager, 1_000).unwrap();
        assert_eq!(batch.incidents.len(), 1);
        assert_eq!(batch.incidents[0].status, IncidentStatus::Resolved);
    }

    #[test]
    fn replica_labels_map_to_same_incident() {
        let n = normalizer();
        let mk = |pod: &str| {
            serde_json::to_vec(&serde_json::json!({
                "alerts": [{
                    "status": "firing",
                    "labels": {
                        "alertname": "CheckoutDown",
                        "severity": "critical",
                        "service": "checkout",
                        "pod": pod
                    }
                }]
            }))
            .unwrap()
        };
        let a = n.normalize(&mk("checkout-abc"), SourceKind::Alertmanager, 1_000).unwrap();
        let b = n.normalize(&mk("checkout-xyz"), SourceKind::Alertmanager, 20_000).unwrap();
        assert_eq!(a.incidents[0].incident_id, b.incidents[0].incident_id);
    }

    #[test]
    fn generic_payload_normalizes() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "name": "DiskPressure",
            "severity": "warning",
            "labels": {"service": "storage"},
            "annotations": {"action_hint": "drain"}
        }))
        .unwrap();
        let batch = normalizer()
            .normalize(&payload, SourceKind::Generic, 1_000)
            .unwrap();
        assert_eq!(batch.incidents.len(), 1);
        let inc = &batch.incidents[0];
        assert_eq!(inc.alert_name(), "DiskPressure");
        assert_eq!(inc.severity, Severity::Warning);
        assert_eq!(inc.action_hint(), Some("drain"));
    }

    #[test]
    fn generic_payload_missing_name_rejected() {
        let payload = serde_json::to_vec(&serde_json::json!({"severity": "warning"})).unwrap();
        let err = normalizer()
            .normalize(&payload, SourceKind::Generic, 1_000)
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_ALERT_NAME");
    }

    #[test]
    fn multi_alert_delivery_emits_each() {
        let payload = serde_json::to_vec(&serde_json::json!({
            "alerts": [
                {"status": "firing", "labels": {"alertname": "CheckoutHighErrorRate", "severity": "critical"}},
                {"status": "firing", "labels": {"alertname": "CheckoutHighLatencyP95", "severity": "warning"}}
            ]
        }))
        .unwrap();
        let batch = normalizer()
            .normalize(&payload, SourceKind::Alertmanager, 1_000)
            .unwrap();
        assert_eq!(batch.incidents.len(), 2);
    }

    #[test]
    fn source_kind_parse() {
        assert_eq!(SourceKind::parse("alertmanager"), Some(SourceKind::Alertmanager));
        assert_eq!(SourceKind::parse("generic"), Some(SourceKind::Generic));
        assert_eq!(SourceKind::parse("pagerduty"), None);
    }
}
