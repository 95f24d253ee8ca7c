use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Canonical unit of work. Created by the normalizer, never mutated after
/// creation; a `resolved` delivery is a new `Incident` value referencing the
/// same fingerprint, not a mutation of the firing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub fingerprint: String,
    pub status: IncidentStatus,
    pub severity: Severity,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub received_at_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Firing,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firing => "firing",
            Self::Resolved => "resolved",
        }
    }
}

/// Ordered: `Info < Warning < Critical`. The ordering backs the
/// auto-remediation threshold and policy matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl Incident {
    pub fn alert_name(&self) -> &str {
        self.labels
            .get("alertname")
            .map(String::as_str)
            .unwrap_or("UnknownAlert")
    }

    pub fn service(&self) -> &str {
        self.labels
            .get("service")
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Explicit remediation override carried by the source, e.g.
    /// `annotations.action_hint: restart`.
    pub fn action_hint(&self) -> Option<&str> {
        self.annotations.get("action_hint").map(String::as_str)
    }

    pub fn summary(&self) -> String {
        format!(
            "[{}] {} - {} ({})",
            self.severity.as_str().to_uppercase(),
            self.service(),
            self.alert_name(),
            self.status.as_str()
        )
    }
}
