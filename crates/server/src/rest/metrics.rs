use axum::extract::State;

use responder_engine::metrics::render_prometheus;

use super::router::AppState;

pub async fn metrics(State(state): State<AppState>) -> String {
    render_prometheus(state.engine.metrics())
}
