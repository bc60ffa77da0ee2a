pub mod health;
pub mod pvs;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                 WebSocket event stream
///
/// /pvs                list every published PV
/// /pvs/{name}         read (GET) or write (PUT) one PV
///
/// /targets            per-target snapshots
/// /summary            summary snapshot
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/pvs", pvs::router())
        .route("/targets", get(handlers::pvs::list_targets))
        .route("/summary", get(handlers::pvs::get_summary))
}
