use axum::{extract::State, routing::post, Router};
use tracing::info;

use crate::jobs::{collect_quotes_job, load_latest_job};
use crate::models::InvocationResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collect", post(trigger_collect))
        .route("/load", post(trigger_load))
}

/// POST /api/jobs/collect - Run the collector once
async fn trigger_collect(State(state): State<AppState>) -> InvocationResult {
    info!("POST /api/jobs/collect");
    collect_quotes_job::run(&state.collector).await
}

/// POST /api/jobs/load - Load the newest archived snapshot
async fn trigger_load(State(state): State<AppState>) -> InvocationResult {
    info!("POST /api/jobs/load");
    load_latest_job::run(&state.loader).await
}
