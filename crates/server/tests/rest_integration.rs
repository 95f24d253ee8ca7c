use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use responder_engine::config;
use responder_engine::engine::Engine;
use responder_engine::executor::config_store::InMemoryConfigStore;
use responder_engine::test_harness::{CollectingNotifier, MockControlPlane, StaticTokenProvider};
use responder_server::rest::{router, AppState};

fn test_engine(notifier: Arc<CollectingNotifier>) -> Arc<Engine> {
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
    Arc::new(Engine::new(
        cfg,
        Arc::new(MockControlPlane::new()),
        Arc::new(StaticTokenProvider::default()),
        Arc::new(InMemoryConfigStore::new()),
        notifier,
    ))
}

fn app(engine: Arc<Engine>) -> Router {
    router(AppState { engine })
}

fn firing_body() -> String {
    serde_json::json!({
        "alerts": [{
            "status": "firing",
            "labels": {
                "alertname": "CheckoutHighErrorRate",
                "severity": "critical",
                "service": "checkout"
            },
            "annotations": {}
        }]
    })
    .to_string()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

fn post_alerts(body: String) -> Request<Body> {
    Request::post("/api/v1/alerts")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn valid_delivery_accepted_with_correlation_id() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let (status, body) = send(app(engine), post_alerts(firing_body())).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["incident_count"], 1);
    assert!(body["correlation_id"].as_str().unwrap().starts_with("corr-"));
}

#[tokio::test]
async fn malformed_payload_rejected() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let (status, body) = send(app(engine), post_alerts("{not json".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error_code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn missing_alert_name_rejected() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let body = serde_json::json!({
        "alerts": [{"status": "firing", "labels": {"severity": "critical"}}]
    })
    .to_string();
    let (status, resp) = send(app(engine), post_alerts(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error_code"], "MISSING_ALERT_NAME");
}

#[tokio::test]
async fn invalid_severity_rejected() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let body = serde_json::json!({
        "alerts": [{
            "status": "firing",
            "labels": {"alertname": "CheckoutDown", "severity": "ticket"}
        }]
    })
    .to_string();
    let (status, resp) = send(app(engine), post_alerts(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error_code"], "INVALID_SEVERITY");
}

#[tokio::test]
async fn unknown_source_rejected() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let req = Request::post("/api/v1/alerts?source=pagerduty")
        .header("content-type", "application/json")
        .body(Body::from(firing_body()))
        .unwrap();
    let (status, resp) = send(app(engine), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error_code"], "INVALID_PAYLOAD");
}

#[tokio::test]
async fn generic_source_accepted() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let body = serde_json::json!({
        "name": "DiskPressure",
        "severity": "warning",
        "labels": {"service": "storage"}
    })
    .to_string();
    let req = Request::post("/api/v1/alerts?source=generic")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let (status, resp) = send(app(engine), req).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(resp["incident_count"], 1);
}

#[tokio::test]
async fn projection_read_returns_execution_and_audit_trail() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let application = app(engine.clone());

    let (status, _) = send(application.clone(), post_alerts(firing_body())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    tokio::time::sleep(Duration::from_millis(80)).await;

    let (status, list) = send(
        application.clone(),
        Request::get("/api/v1/incidents").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let incident_id = list[0]["incident_id"].as_str().unwrap().to_string();

    let (status, proj) = send(
        application,
        Request::get(format!("/api/v1/incidents/{incident_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(proj["incident"]["labels"]["alertname"], "CheckoutHighErrorRate");
    assert!(proj["execution"]["state"].is_string());
    assert!(proj["records"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn unknown_incident_is_404() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let (status, _) = send(
        app(engine),
        Request::get("/api/v1/incidents/inc-missing")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cancel_active_workflow_then_conflict_when_terminal() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let application = app(engine.clone());

    send(application.clone(), post_alerts(firing_body())).await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    let incident_id = engine.ledger().list()[0].incident_id.clone();

    let (status, _) = send(
        application.clone(),
        Request::post(format!("/api/v1/incidents/{incident_id}/cancel"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"reason": "manual intervention"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // Wait for the workflow to land in escalated, then cancelling again
    // has nothing to cancel.
    for _ in 0..200 {
        if let Some(exec) = engine.ledger().execution(&incident_id) {
            if !exec.is_open() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let (status, _) = send(
        application,
        Request::post(format!("/api/v1/incidents/{incident_id}/cancel"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn dlq_list_replay_and_delete() {
    // A permanently failing notifier fills the DLQ.
    let engine = test_engine(Arc::new(CollectingNotifier::failing()));
    let application = app(engine.clone());

    send(application.clone(), post_alerts(firing_body())).await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    let (status, held) = send(
        application.clone(),
        Request::get("/api/v1/dlq?target=notifier")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(held.as_array().unwrap().len(), 1);
    let id = held[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        application.clone(),
        Request::post(format!("/api/v1/dlq/{id}/replay"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    // Replay against the still-dead notifier dead-letters again.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let held = engine.dead_letters().list(Some("notifier"));
    assert_eq!(held.len(), 1);

    let (status, _) = send(
        application.clone(),
        Request::delete(format!("/api/v1/dlq/{}", held[0].id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        application,
        Request::post("/api/v1/dlq/missing-id/replay")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn operational_endpoints_respond() {
    let engine = test_engine(Arc::new(CollectingNotifier::new()));
    let application = app(engine);

    let resp = application
        .clone()
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = application
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = application
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("responder_engine_incidents_ingested_total"));
}
