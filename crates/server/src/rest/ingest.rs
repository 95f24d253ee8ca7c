use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use responder_engine::incident::normalize::SourceKind;

use super::router::AppState;

#[derive(Deserialize)]
pub struct IngestQuery {
    pub source: Option<String>,
}

#[derive(Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
    pub incident_count: usize,
    pub correlation_id: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error_code: &'static str,
    pub message: String,
}

pub async fn ingest_alerts(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
    body: Bytes,
) -> Response {
    let source = match query.source.as_deref() {
        None => SourceKind::Alertmanager,
        Some(s) => match SourceKind::parse(s) {
            Some(kind) => kind,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        status: "error",
                        error_code: "INVALID_PAYLOAD",
                        message: format!("unknown source {s:?}"),
                    }),
                )
                    .into_response()
            }
        },
    };

    match state.engine.ingest(&body, source) {
        Ok(report) => {
            tracing::info!(
                correlation_id = %report.correlation_id,
                incidents = report.incident_count,
                suppressed = report.suppressed,
                "alert delivery accepted"
            );
            (
                StatusCode::ACCEPTED,
                Json(AcceptedResponse {
                    status: "accepted",
                    incident_count: report.incident_count,
                    correlation_id: report.correlation_id,
                }),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                status: "error",
                error_code: e.error_code(),
                message: e.to_string(),
            }),
        )
            .into_response(),
    }
}
