//! Route definitions for the named PV control surface.

use axum::routing::get;
use axum::Router;

use crate::handlers::pvs;
use crate::state::AppState;

/// Routes mounted at `/pvs`.
///
/// ```text
/// GET  /           -> list_pvs
/// GET  /{name}     -> get_pv
/// PUT  /{name}     -> put_pv
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pvs::list_pvs))
        .route("/{name}", get(pvs::get_pv).put(pvs::put_pv))
}
