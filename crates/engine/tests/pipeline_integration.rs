use std::sync::Arc;
use std::time::Duration;

use responder_engine::config;
use responder_engine::engine::Engine;
use responder_engine::executor::config_store::InMemoryConfigStore;
use responder_engine::incident::normalize::SourceKind;
use responder_engine::ledger::EventKind;
use responder_engine::test_harness::{CollectingNotifier, MockControlPlane, StaticTokenProvider};

fn fast_engine(notifier: Arc<CollectingNotifier>) -> Engine {
    let cfg = config::load_from_str(
        r#"
coalescing_window_ms: 10000
stabilization_window_ms: 2000
attempt_backoff:
  base_delay_ms: 5
  max_delay_ms: 20
route_retry:
  max_attempts: 2
  base_delay_ms: 2
  max_delay_ms: 4
"#,
    )
    .unwrap();
    Engine::new(
        cfg,
        Arc::new(MockControlPlane::new()),
        Arc::new(StaticTokenProvider::default()),
        Arc::new(InMemoryConfigStore::new()),
        notifier,
    )
}

fn firing_payload() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "alerts": [{
            "status": "firing",
            "labels": {
                "alertname": "CheckoutHighErrorRate",
                "severity": "critical",
                "service": "checkout"
            },
            "annotations": {"summary": "error rate above SLO"}
        }]
    }))
    .unwrap()
}

#[tokio::test]
async fn ingest_fans_out_to_ledger_workflow_and_notifier() {
    let notifier = Arc::new(CollectingNotifier::new());
    let engine = fast_engine(notifier.clone());

    let report = engine
        .ingest(&firing_payload(), SourceKind::Alertmanager)
        .unwrap();
    assert_eq!(report.incident_count, 1);
    assert!(report.correlation_id.starts_with("corr-"));
    assert!(report.routes[0].fully_accepted());
    let incident_id = report.routes[0].incident_id.clone();

    tokio::time::sleep(Duration::from_millis(80)).await;

    // Ledger target recorded the occurrence and the orchestrator opened an
    // execution with its audit trail.
    let proj = engine.ledger().projection(&incident_id).unwrap();
    assert!(proj.incident.is_some());
    assert!(proj.execution.is_some());
    let kinds: Vec<EventKind> = proj.records.iter().map(|r| r.event_kind).collect();
    assert!(kinds.contains(&EventKind::IncidentReceived));
    assert!(kinds.contains(&EventKind::WorkflowStarted));

    // Notifier target pushed the firing occurrence.
    assert!(notifier
        .updates()
        .iter()
        .any(|u| u.incident_id == incident_id && u.new_status == "firing"));
}

#[tokio::test]
async fn dead_notifier_does_not_block_workflow_start() {
    let engine = fast_engine(Arc::new(CollectingNotifier::failing()));

    let report = engine
        .ingest(&firing_payload(), SourceKind::Alertmanager)
        .unwrap();
    let incident_id = report.routes[0].incident_id.clone();

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Workflow and ledger progressed regardless.
    assert!(engine.ledger().execution(&incident_id).is_some());
    assert_eq!(engine.metrics().workflows_started_val(), 1);

    // The notifier deliveries exhausted retries into dead-letter holding.
    let held = engine.dead_letters().list(Some("notifier"));
    assert_eq!(held.len(), 1);
    assert_eq!(held[0].incident_id, incident_id);
    assert_eq!(held[0].attempts, 2);
    assert!(engine.metrics().deliveries_dead_lettered_val() >= 1);
}

#[tokio::test]
async fn malformed_payload_counts_validation_failure() {
    let engine = fast_engine(Arc::new(CollectingNotifier::new()));
    let err = engine
        .ingest(b"{\"alerts\": \"nope\"}", SourceKind::Alertmanager)
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_PAYLOAD");
    assert_eq!(engine.metrics().validation_failures_val(), 1);
}

#[tokio::test]
async fn resolved_without_open_execution_is_a_noop() {
    let engine = fast_engine(Arc::new(CollectingNotifier::new()));
    let payload = serde_json::to_vec(&serde_json::json!({
        "alerts": [{
            "status": "resolved",
            "labels": {"alertname": "CheckoutHighErrorRate", "severity": "critical"}
        }]
    }))
    .unwrap();

    let report = engine.ingest(&payload, SourceKind::Alertmanager).unwrap();
    assert_eq!(report.incident_count, 0);
    assert_eq!(report.dropped_resolved, 1);
    assert_eq!(engine.metrics().workflows_started_val(), 0);
}

#[tokio::test]
async fn generic_source_flows_through_the_same_pipeline() {
    let engine = fast_engine(Arc::new(CollectingNotifier::new()));
    let payload = serde_json::to_vec(&serde_json::json!({
        "name": "CheckoutDown",
        "severity": "critical",
        "labels": {"service": "checkout"}
    }))
    .unwrap();

    let report = engine.ingest(&payload, SourceKind::Generic).unwrap();
    assert_eq!(report.incident_count, 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(engine.metrics().workflows_started_val(), 1);
}

#[tokio::test]
async fn maintenance_archives_terminal_executions() {
    let engine = {
        // Zero retention so anything terminal is archived immediately.
        let cfg = config::load_from_str(
            "stabilization_window_ms: 50\nretention_ms: 1\nattempt_backoff:\n  base_delay_ms: 5\n  max_delay_ms: 20\n",
        )
        .unwrap();
        Engine::new(
            cfg,
            Arc::new(MockControlPlane::new()),
            Arc::new(StaticTokenProvider::default()),
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(CollectingNotifier::new()),
        )
    };

    let report = engine
        .ingest(&firing_payload(), SourceKind::Alertmanager)
        .unwrap();
    let incident_id = report.routes[0].incident_id.clone();

    // Wait for the workflow to run out (degrade + scale verify timeouts).
    for _ in 0..400 {
        if let Some(exec) = engine.ledger().execution(&incident_id) {
            if !exec.is_open() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!engine.ledger().execution(&incident_id).unwrap().is_open());

    tokio::time::sleep(Duration::from_millis(10)).await;
    let archived = engine.run_maintenance();
    assert_eq!(archived, 1);
    assert!(engine.ledger().projection(&incident_id).is_none());
}
