use std::sync::Arc;

use serde::Serialize;

use responder_common::ids::new_correlation_id;
use responder_common::time::now_ms;

use crate::config::EngineConfig;
use crate::executor::config_store::ConfigStore;
use crate::executor::control_plane::ControlPlane;
use crate::executor::token::ScopedTokenProvider;
use crate::executor::ActionExecutor;
use crate::incident::model::IncidentStatus;
use crate::incident::normalize::{Normalizer, SourceKind, ValidationError};
use crate::ledger::Ledger;
use crate::metrics::EngineMetrics;
use crate::notifier::channel::{Notifier, StatusUpdate};
use crate::router::dead_letter::DeadLetterStore;
use crate::router::dispatch::{ReplayError, RouteResult, Router};
use crate::router::target::{Delivery, DeliveryError, RouteTarget};
use crate::workflow::orchestrator::{Orchestrator, StartOutcome};
use crate::workflow::policy::RemediationPolicy;

use async_trait::async_trait;

/// Outcome of one ingestion request.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub correlation_id: String,
    pub incident_count: usize,
    pub suppressed: usize,
    pub dropped_resolved: usize,
    pub routes: Vec<RouteResult>,
}

/// Wires the full pipeline: normalizer → router → {ledger, workflow,
/// notifier}. Must be constructed inside a tokio runtime (the router and
/// orchestrator spawn worker tasks).
pub struct Engine {
    cfg: EngineConfig,
    normalizer: Normalizer,
    router: Router,
    ledger: Arc<Ledger>,
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<EngineMetrics>,
}

impl Engine {
    pub fn new(
        cfg: EngineConfig,
        control_plane: Arc<dyn ControlPlane>,
        tokens: Arc<dyn ScopedTokenProvider>,
        config_store: Arc<dyn ConfigStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let metrics = EngineMetrics::new();
        let ledger = Arc::new(Ledger::new());

        let executor = Arc::new(ActionExecutor::new(
            control_plane,
            tokens,
            config_store,
            cfg.call_timeout(),
        ));

        let rules = if cfg.policies.is_empty() {
            RemediationPolicy::default_rules()
        } else {
            cfg.policies.clone()
        };
        let policy = RemediationPolicy::new(rules, cfg.auto_remediation_threshold);

        let orchestrator = Arc::new(Orchestrator::new(
            ledger.clone(),
            executor,
            policy,
            notifier.clone(),
            metrics.clone(),
            cfg.workflow_config(),
        ));

        let mut router = Router::new(
            cfg.route_retry_policy(),
            Arc::new(DeadLetterStore::new()),
            metrics.clone(),
        );
        router.register(Arc::new(LedgerTarget {
            ledger: ledger.clone(),
        }));
        router.register(Arc::new(WorkflowTarget {
            orchestrator: orchestrator.clone(),
        }));
        router.register(Arc::new(NotifierTarget { notifier }));

        let normalizer = Normalizer::new(cfg.coalescing_window_ms, ledger.clone());

        Self {
            cfg,
            normalizer,
            router,
            ledger,
            orchestrator,
            metrics,
        }
    }

    /// Normalize one raw delivery and fan the resulting incidents out.
    pub fn ingest(&self, raw: &[u8], source: SourceKind) -> Result<IngestReport, ValidationError> {
        let correlation_id = new_correlation_id();
        let batch = self
            .normalizer
            .normalize(raw, source, now_ms())
            .map_err(|e| {
                self.metrics.inc_validation_failures();
                e
            })?;

        self.metrics.add_deliveries_suppressed(batch.suppressed as u64);
        self.metrics.add_resolved_dropped(batch.dropped_resolved as u64);

        let mut routes = Vec::with_capacity(batch.incidents.len());
        for incident in &batch.incidents {
            self.metrics.inc_incidents_ingested();
            routes.push(self.router.route(incident, &correlation_id));
        }

        Ok(IngestReport {
            correlation_id,
            incident_count: batch.incidents.len(),
            suppressed: batch.suppressed,
            dropped_resolved: batch.dropped_resolved,
            routes,
        })
    }

    /// Archive terminal executions past retention and drop stale
    /// coalescing markers. Intended to run periodically.
    pub fn run_maintenance(&self) -> usize {
        let cutoff = now_ms() - self.cfg.retention_ms;
        self.normalizer.evict_markers(cutoff);
        self.ledger.archive_expired(cutoff)
    }

    pub fn replay_dead_letter(&self, id: &str) -> Result<(), ReplayError> {
        self.router.replay(id)
    }

    pub fn cancel_workflow(&self, incident_id: &str, reason: &str) -> bool {
        self.orchestrator.cancel(incident_id, reason)
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn dead_letters(&self) -> &Arc<DeadLetterStore> {
        self.router.dead_letters()
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }
}

/// Appends every delivery to the audit log before anything acts on it.
struct LedgerTarget {
    ledger: Arc<Ledger>,
}

#[async_trait]
impl RouteTarget for LedgerTarget {
    fn name(&self) -> &'static str {
        "ledger"
    }

    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError> {
        self.ledger.record_incident(&delivery.incident);
        Ok(())
    }
}

/// Starts a workflow on firing occurrences and feeds recovery signals on
/// resolved ones. Redelivery is harmless: duplicate starts are rejected by
/// the orchestrator's active set.
struct WorkflowTarget {
    orchestrator: Arc<Orchestrator>,
}

#[async_trait]
impl RouteTarget for WorkflowTarget {
    fn name(&self) -> &'static str {
        "workflow"
    }

    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError> {
        let incident = &delivery.incident;
        match incident.status {
            IncidentStatus::Firing => {
                if self.orchestrator.start(incident.clone()) == StartOutcome::AlreadyActive {
                    tracing::debug!(
                        incident_id = %incident.incident_id,
                        "workflow already active, start skipped"
                    );
                }
            }
            IncidentStatus::Resolved => {
                self.orchestrator.observe_recovery(&incident.incident_id);
            }
        }
        Ok(())
    }
}

/// Pushes the raw occurrence to the external notification channel.
struct NotifierTarget {
    notifier: Arc<dyn Notifier>,
}

#[async_trait]
impl RouteTarget for NotifierTarget {
    fn name(&self) -> &'static str {
        "notifier"
    }

    async fn deliver(&self, delivery: &Delivery) -> Result<(), DeliveryError> {
        let incident = &delivery.incident;
        let update = StatusUpdate {
            incident_id: incident.incident_id.clone(),
            new_status: incident.status.as_str().to_string(),
            summary: incident.summary(),
        };
        self.notifier
            .send(&update)
            .await
            .map_err(|e| DeliveryError(e.to_string()))
    }
}
