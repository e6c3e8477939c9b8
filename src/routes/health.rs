use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    archive: String,
    symbols: Vec<String>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    debug!("GET /health - Health check");
    Json(HealthResponse {
        status: "OK",
        archive: state.collector.location().to_string(),
        symbols: state.collector.symbols().to_vec(),
    })
}
