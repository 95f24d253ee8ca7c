use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// Labels that differ between replicas of the same logical condition and
/// must not influence identity.
const VOLATILE_LABELS: &[&str] = &[
    "pod",
    "instance",
    "pod_template_hash",
    "container_id",
    "node",
    "replica",
];

/// Deterministic fingerprint over the alert name and the sorted stable
/// label set. 32 lowercase hex chars (SHA-256 truncated to 16 bytes).
pub fn compute(alert_name: &str, labels: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = labels
        .keys()
        .filter(|k| !VOLATILE_LABELS.contains(&k.as_str()))
        .collect();
    keys.sort();

    let mut hasher = Sha256::new();
    hasher.update(alert_name.as_bytes());
    for k in keys {
        hasher.update(b"|");
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(labels[k].as_bytes());
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for byte in &digest[..16] {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Incident identity derived from the fingerprint, so redelivery of the
/// same condition maps to the same incident.
pub fn incident_id(fingerprint: &str) -> String {
    format!("inc-{}", &fingerprint[..16.min(fingerprint.len())])
}
