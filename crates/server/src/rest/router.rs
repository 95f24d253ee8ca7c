use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use responder_engine::engine::Engine;

use super::{dlq, health, incidents, ingest, metrics};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/ready", get(health::ready))
        .route("/metrics", get(metrics::metrics))
        .route("/api/v1/alerts", post(ingest::ingest_alerts))
        .route("/api/v1/incidents", get(incidents::list_incidents))
        .route("/api/v1/incidents/{incident_id}", get(incidents::get_incident))
        .route(
            "/api/v1/incidents/{incident_id}/cancel",
            post(incidents::cancel_incident),
        )
        .route("/api/v1/dlq", get(dlq::list_dead_letters))
        .route("/api/v1/dlq/{id}", delete(dlq::delete_dead_letter))
        .route("/api/v1/dlq/{id}/replay", post(dlq::replay_dead_letter))
        .with_state(state)
}
