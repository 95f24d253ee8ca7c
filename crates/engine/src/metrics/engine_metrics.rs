use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    incidents_ingested: AtomicU64,
    deliveries_suppressed: AtomicU64,
    resolved_dropped: AtomicU64,
    validation_failures: AtomicU64,
    workflows_started: AtomicU64,
    workflows_resolved: AtomicU64,
    workflows_failed: AtomicU64,
    workflows_escalated: AtomicU64,
    actions_attempted: AtomicU64,
    actions_failed: AtomicU64,
    deliveries_dead_lettered: AtomicU64,
    dead_letters_replayed: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_incidents_ingested(&self) {
        self.incidents_ingested.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_deliveries_suppressed(&self, n: u64) {
        self.deliveries_suppressed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_resolved_dropped(&self, n: u64) {
        self.resolved_dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_validation_failures(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_workflows_started(&self) {
        self.workflows_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_workflows_resolved(&self) {
        self.workflows_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_workflows_failed(&self) {
        self.workflows_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_workflows_escalated(&self) {
        self.workflows_escalated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_actions_attempted(&self) {
        self.actions_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_actions_failed(&self) {
        self.actions_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_deliveries_dead_lettered(&self) {
        self.deliveries_dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dead_letters_replayed(&self) {
        self.dead_letters_replayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_notifications_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incidents_ingested_val(&self) -> u64 {
        self.incidents_ingested.load(Ordering::Relaxed)
    }

    pub fn deliveries_suppressed_val(&self) -> u64 {
        self.deliveries_suppressed.load(Ordering::Relaxed)
    }

    pub fn resolved_dropped_val(&self) -> u64 {
        self.resolved_dropped.load(Ordering::Relaxed)
    }

    pub fn validation_failures_val(&self) -> u64 {
        self.validation_failures.load(Ordering::Relaxed)
    }

    pub fn workflows_started_val(&self) -> u64 {
        self.workflows_started.load(Ordering::Relaxed)
    }

    pub fn workflows_resolved_val(&self) -> u64 {
        self.workflows_resolved.load(Ordering::Relaxed)
    }

    pub fn workflows_failed_val(&self) -> u64 {
        self.workflows_failed.load(Ordering::Relaxed)
    }

    pub fn workflows_escalated_val(&self) -> u64 {
        self.workflows_escalated.load(Ordering::Relaxed)
    }

    pub fn actions_attempted_val(&self) -> u64 {
        self.actions_attempted.load(Ordering::Relaxed)
    }

    pub fn actions_failed_val(&self) -> u64 {
        self.actions_failed.load(Ordering::Relaxed)
    }

    pub fn deliveries_dead_lettered_val(&self) -> u64 {
        self.deliveries_dead_lettered.load(Ordering::Relaxed)
    }

    pub fn dead_letters_replayed_val(&self) -> u64 {
        self.dead_letters_replayed.load(Ordering::Relaxed)
    }

    pub fn notifications_sent_val(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn notifications_failed_val(&self) -> u64 {
        self.notifications_failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let m = EngineMetrics::new();
        m.inc_incidents_ingested();
        m.inc_incidents_ingested();
        m.add_deliveries_suppressed(3);
        assert_eq!(m.incidents_ingested_val(), 2);
        assert_eq!(m.deliveries_suppressed_val(), 3);
        assert_eq!(m.workflows_started_val(), 0);
    }
}
