use serde::Deserialize;

use crate::executor::{ActionKind, PlannedAction};
use crate::incident::model::{Incident, Severity};

/// One ordered policy entry: which alerts it covers, the minimum severity
/// it fires at, and the ranked actions to try in order.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    /// Exact alert names, or a trailing-`*` prefix match.
    pub alert_patterns: Vec<String>,
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
    pub actions: Vec<ActionKind>,
}

fn default_min_severity() -> Severity {
    Severity::Warning
}

/// Ranked remediation policy. Rules are consulted in order; the first match
/// wins. An `action_hint` annotation overrides the rules outright, and an
/// incident below the auto-remediation threshold always escalates.
pub struct RemediationPolicy {
    rules: Vec<PolicyRule>,
    auto_threshold: Severity,
}

impl RemediationPolicy {
    pub fn new(rules: Vec<PolicyRule>, auto_threshold: Severity) -> Self {
        Self {
            rules,
            auto_threshold,
        }
    }

    /// Default table mirroring the runbook this engine grew out of:
    /// customer-facing pressure degrades first and scales second; a down
    /// service gets a rolling restart.
    pub fn default_rules() -> Vec<PolicyRule> {
        vec![
            PolicyRule {
                name: "customer-pressure".into(),
                alert_patterns: vec![
                    "CheckoutHighLatencyP95".into(),
                    "CheckoutHighErrorRate".into(),
                    "CheckoutSLOBurnFast".into(),
                ],
                min_severity: Severity::Warning,
                actions: vec![ActionKind::Degrade, ActionKind::Scale],
            },
            PolicyRule {
                name: "service-down".into(),
                alert_patterns: vec!["*Down".into()],
                min_severity: Severity::Warning,
                actions: vec![ActionKind::Restart],
            },
        ]
    }

    /// Resolve the ranked action plan for an incident. Empty plan means no
    /// auto-remediation applies and the workflow escalates.
    pub fn plan(&self, incident: &Incident) -> Vec<PlannedAction> {
        if incident.severity < self.auto_threshold {
            return Vec::new();
        }

        if let Some(hint) = incident.action_hint() {
            return match ActionKind::parse(hint) {
                Some(kind) => vec![self.planned(kind, incident)],
                None => {
                    tracing::warn!(
                        incident_id = %incident.incident_id,
                        hint,
                        "unknown action_hint annotation ignored"
                    );
                    Vec::new()
                }
            };
        }

        let name = incident.alert_name();
        for rule in &self.rules {
            if incident.severity < rule.min_severity {
                continue;
            }
            if rule.alert_patterns.iter().any(|p| pattern_matches(p, name)) {
                return rule
                    .actions
                    .iter()
                    .map(|kind| self.planned(*kind, incident))
                    .collect();
            }
        }
        Vec::new()
    }

    fn planned(&self, kind: ActionKind, incident: &Incident) -> PlannedAction {
        let parameters = match kind {
            ActionKind::Scale => {
                let replicas = incident
                    .annotations
                    .get("desired_replicas")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(4);
                serde_json::json!({ "desired_replicas": replicas })
            }
            _ => serde_json::json!({}),
        };
        PlannedAction { kind, parameters }
    }
}

fn pattern_matches(pattern: &str, name: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return name.ends_with(suffix);
    }
    pattern == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::model::IncidentStatus;
    use std::collections::HashMap;

    fn incident(alertname: &str, severity: Severity) -> Incident {
        Incident {
            incident_id: "inc-1".into(),
            fingerprint: "f".repeat(32),
            status: IncidentStatus::Firing,
            severity,
            labels: HashMap::from([
                ("alertname".into(), alertname.to_string()),
                ("service".into(), "checkout".into()),
            ]),
            annotations: HashMap::new(),
            received_at_ms: 1_000,
        }
    }

    fn policy() -> RemediationPolicy {
        RemediationPolicy::new(RemediationPolicy::default_rules(), Severity::Warning)
    }

    #[test]
    fn pressure_alert_degrades_then_scales() {
        let plan = policy().plan(&incident("CheckoutHighErrorRate", Severity::Critical));
        let kinds: Vec<ActionKind> = plan.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Degrade, ActionKind::Scale]);
    }

    #[test]
    fn down_alert_restarts_via_suffix_pattern() {
        let plan = policy().plan(&incident("CheckoutDown", Severity::Critical));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].kind, ActionKind::Restart);

        let plan = policy().plan(&incident("PaymentsDown", Severity::Critical));
        assert_eq!(plan[0].kind, ActionKind::Restart);
    }

    #[test]
    fn unmatched_alert_yields_empty_plan() {
        assert!(policy().plan(&incident("DiskPressure", Severity::Critical)).is_empty());
    }

    #[test]
    fn below_threshold_yields_empty_plan() {
        assert!(policy().plan(&incident("CheckoutDown", Severity::Info)).is_empty());
    }

    #[test]
    fn action_hint_overrides_rules() {
        let mut inc = incident("CheckoutHighErrorRate", Severity::Critical);
        inc.annotations.insert("action_hint".into(), "restart".into());
        let plan = policy().plan(&inc);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].kind, ActionKind::Restart);
    }

    #[test]
    fn unknown_action_hint_escalates() {
        let mut inc = incident("CheckoutHighErrorRate", Severity::Critical);
        inc.annotations.insert("action_hint".into(), "reboot".into());
        assert!(policy().plan(&inc).is_empty());
    }

    #[test]
    fn scale_takes_replicas_from_annotations() {
        let mut inc = incident("CheckoutHighErrorRate", Severity::Critical);
        inc.annotations.insert("desired_replicas".into(), "8".into());
        let plan = policy().plan(&inc);
        assert_eq!(plan[1].parameters["desired_replicas"], 8);
    }

    #[test]
    fn scale_defaults_to_four_replicas() {
        let plan = policy().plan(&incident("CheckoutHighErrorRate", Severity::Critical));
        assert_eq!(plan[1].parameters["desired_replicas"], 4);
    }

    #[test]
    fn rule_min_severity_respected() {
        let rules = vec![PolicyRule {
            name: "critical-only".into(),
            alert_patterns: vec!["*".into()],
            min_severity: Severity::Critical,
            actions: vec![ActionKind::Drain],
        }];
        let p = RemediationPolicy::new(rules, Severity::Warning);
        assert!(p.plan(&incident("Anything", Severity::Warning)).is_empty());
        assert_eq!(p.plan(&incident("Anything", Severity::Critical)).len(), 1);
    }

    #[test]
    fn pattern_matching_variants() {
        assert!(pattern_matches("*", "Whatever"));
        assert!(pattern_matches("Checkout*", "CheckoutDown"));
        assert!(!pattern_matches("Checkout*", "PaymentsDown"));
        assert!(pattern_matches("*Down", "PaymentsDown"));
        assert!(pattern_matches("CheckoutDown", "CheckoutDown"));
        assert!(!pattern_matches("CheckoutDown", "CheckoutDownstream"));
    }
}
