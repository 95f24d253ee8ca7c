use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use responder_engine::ledger::{IncidentSummary, Projection};

use super::router::AppState;

pub async fn list_incidents(State(state): State<AppState>) -> Json<Vec<IncidentSummary>> {
    Json(state.engine.ledger().list())
}

pub async fn get_incident(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
) -> Result<Json<Projection>, StatusCode> {
    state
        .engine
        .ledger()
        .projection(&incident_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Deserialize)]
struct CancelRequest {
    reason: Option<String>,
}

pub async fn cancel_incident(
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    body: Bytes,
) -> Response {
    let reason = serde_json::from_slice::<CancelRequest>(&body)
        .ok()
        .and_then(|r| r.reason)
        .unwrap_or_else(|| "operator cancel".to_string());

    if state.engine.cancel_workflow(&incident_id, &reason) {
        (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "cancelling", "incident_id": incident_id})),
        )
            .into_response()
    } else {
        (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "status": "error",
                "message": "no active workflow for incident"
            })),
        )
            .into_response()
    }
}
