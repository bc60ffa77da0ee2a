use std::sync::Arc;

use pvwatch_engine::{ControlSurface, WatcherRegistry};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub registry: Arc<WatcherRegistry>,
    /// Named PV reads and writes over `registry`.
    pub control: Arc<ControlSurface>,
    /// WebSocket connection manager (event stream clients).
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        registry: Arc<WatcherRegistry>,
        ws_manager: Arc<WsManager>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            control: Arc::new(ControlSurface::new(Arc::clone(&registry))),
            registry,
            ws_manager,
        }
    }
}
