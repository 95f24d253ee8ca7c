use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use responder_engine::router::dead_letter::DeadLetter;
use responder_engine::router::dispatch::ReplayError;

use super::router::AppState;

#[derive(Deserialize)]
pub struct DlqQuery {
    pub target: Option<String>,
}

pub async fn list_dead_letters(
    State(state): State<AppState>,
    Query(query): Query<DlqQuery>,
) -> Json<Vec<DeadLetter>> {
    Json(state.engine.dead_letters().list(query.target.as_deref()))
}

pub async fn replay_dead_letter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.engine.replay_dead_letter(&id) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({"status": "replaying", "id": id})),
        )
            .into_response(),
        Err(ReplayError::NotFound) => StatusCode::NOT_FOUND.into_response(),
        Err(e @ ReplayError::UnknownTarget(_)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"status": "error", "message": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn delete_dead_letter(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StatusCode {
    if state.engine.dead_letters().delete(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
