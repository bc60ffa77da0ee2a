use axum::extract::State;
use axum::{routing::get, Json, Router};
use pvwatch_core::verdict::Verdict;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub summary_status: Verdict,
    pub master_enabled: bool,
    pub target_count: usize,
    /// Targets currently receiving samples.
    pub connected_count: usize,
}

/// GET /health -- returns service status and a one-line view of the watcher.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let summary = state.registry.aggregator().snapshot();
    let connected_count = state
        .registry
        .watchers()
        .filter(|w| w.snapshot().connected)
        .count();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        summary_status: summary.status,
        master_enabled: summary.master_enabled,
        target_count: state.registry.len(),
        connected_count,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
