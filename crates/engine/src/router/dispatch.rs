use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use responder_common::retry::RetryPolicy;

use super::dead_letter::DeadLetterStore;
use super::target::{Delivery, RouteTarget};
use crate::incident::model::Incident;
use crate::metrics::EngineMetrics;

/// Fans normalized incidents out to registered targets with at-least-once
/// semantics. Each target owns an ordered FIFO queue drained by its own
/// worker task, so deliveries for one incident reach a target in routing
/// order and a dead target never blocks the others.
pub struct Router {
    targets: Vec<TargetHandle>,
    dead_letters: Arc<DeadLetterStore>,
    retry: RetryPolicy,
    metrics: Arc<EngineMetrics>,
}

struct TargetHandle {
    name: &'static str,
    tx: mpsc::UnboundedSender<Delivery>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetDelivery {
    pub target: &'static str,
    pub accepted: bool,
}

/// Per-target acceptance report for one routed incident. Accepted means
/// queued for at-least-once delivery, not yet delivered.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub incident_id: String,
    pub deliveries: Vec<TargetDelivery>,
}

impl RouteResult {
    pub fn fully_accepted(&self) -> bool {
        self.deliveries.iter().all(|d| d.accepted)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReplayError {
    NotFound,
    UnknownTarget(String),
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "dead letter not found"),
            Self::UnknownTarget(t) => write!(f, "dead letter target {t:?} is not registered"),
        }
    }
}

impl std::error::Error for ReplayError {}

impl Router {
    pub fn new(
        retry: RetryPolicy,
        dead_letters: Arc<DeadLetterStore>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            targets: Vec::new(),
            dead_letters,
            metrics,
            retry,
        }
    }

    /// Register a target and spawn its delivery worker.
    pub fn register(&mut self, target: Arc<dyn RouteTarget>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let name = target.name();
        tokio::spawn(run_target_worker(
            target,
            rx,
            self.retry.clone(),
            self.dead_letters.clone(),
            self.metrics.clone(),
        ));
        self.targets.push(TargetHandle { name, tx });
    }

    /// Enqueue the incident to every registered target.
    pub fn route(&self, incident: &Incident, correlation_id: &str) -> RouteResult {
        let mut deliveries = Vec::with_capacity(self.targets.len());
        for handle in &self.targets {
            let accepted = handle
                .tx
                .send(Delivery {
                    incident: incident.clone(),
                    correlation_id: correlation_id.to_string(),
                })
                .is_ok();
            if !accepted {
                tracing::error!(target = handle.name, "target queue closed, delivery refused");
            }
            deliveries.push(TargetDelivery {
                target: handle.name,
                accepted,
            });
        }
        RouteResult {
            incident_id: incident.incident_id.clone(),
            deliveries,
        }
    }

    /// Re-enqueue a held delivery to its original target and drop the hold.
    pub fn replay(&self, dead_letter_id: &str) -> Result<(), ReplayError> {
        let entry = self
            .dead_letters
            .get(dead_letter_id)
            .ok_or(ReplayError::NotFound)?;
        let handle = self
            .targets
            .iter()
            .find(|h| h.name == entry.target)
            .ok_or_else(|| ReplayError::UnknownTarget(entry.target.clone()))?;

        self.dead_letters.delete(dead_letter_id);
        let _ = handle.tx.send(entry.delivery);
        self.metrics.inc_dead_letters_replayed();
        Ok(())
    }

    pub fn dead_letters(&self) -> &Arc<DeadLetterStore> {
        &self.dead_letters
    }
}

async fn run_target_worker(
    target: Arc<dyn RouteTarget>,
    mut rx: mpsc::UnboundedReceiver<Delivery>,
    retry: RetryPolicy,
    dead_letters: Arc<DeadLetterStore>,
    metrics: Arc<EngineMetrics>,
) {
    while let Some(delivery) = rx.recv().await {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match target.deliver(&delivery).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(
                        target = target.name(),
                        incident_id = %delivery.incident.incident_id,
                        attempt,
                        max = retry.max_attempts,
                        error = %e,
                        "delivery attempt failed"
                    );
                    if attempt >= retry.max_attempts {
                        let id = dead_letters.insert(
                            target.name(),
                            delivery.clone(),
                            e.to_string(),
                            attempt,
                        );
                        metrics.inc_deliveries_dead_lettered();
                        tracing::error!(
                            target = target.name(),
                            incident_id = %delivery.incident.incident_id,
                            dead_letter_id = %id,
                            "delivery retries exhausted, moved to dead-letter holding"
                        );
                        break;
                    }
                    tokio::time::sleep(retry.delay_for(attempt)).await;
                }
            }
        }
    }
}
