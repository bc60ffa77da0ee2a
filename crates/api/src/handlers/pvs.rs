//! Handlers for the PV control surface and watcher snapshots.

use axum::extract::{Path, State};
use axum::Json;
use pvwatch_engine::{PvReading, SummarySnapshot, TargetSnapshot};
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for a PV write.
#[derive(Debug, Deserialize)]
pub struct WritePvRequest {
    /// Bool or number for enable flags, number for bounds.
    pub value: serde_json::Value,
}

/// GET /api/v1/pvs
pub async fn list_pvs(State(state): State<AppState>) -> Json<DataResponse<Vec<PvReading>>> {
    Json(DataResponse {
        data: state.control.list(),
    })
}

/// GET /api/v1/pvs/{name}
pub async fn get_pv(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<DataResponse<PvReading>>> {
    let reading = state.control.read(&name)?;
    Ok(Json(DataResponse { data: reading }))
}

/// PUT /api/v1/pvs/{name}
///
/// Returns the PV's reading after the write.
pub async fn put_pv(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<WritePvRequest>,
) -> AppResult<Json<DataResponse<PvReading>>> {
    let reading = state.control.write(&name, &body.value).await?;
    tracing::info!(pv = %name, value = %body.value, "PV written");
    Ok(Json(DataResponse { data: reading }))
}

/// GET /api/v1/targets
pub async fn list_targets(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<TargetSnapshot>>> {
    Json(DataResponse {
        data: state.registry.snapshots(),
    })
}

/// GET /api/v1/summary
pub async fn get_summary(State(state): State<AppState>) -> Json<DataResponse<SummarySnapshot>> {
    Json(DataResponse {
        data: state.registry.aggregator().snapshot(),
    })
}
