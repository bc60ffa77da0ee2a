use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use pvwatch_core::config::MonitorConfig;
use pvwatch_engine::{EventBus, SubscriptionAdapter, WatcherRegistry};
use pvwatch_gateway::GatewayAdapter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pvwatch_api::config::{ConfigError, ServerConfig};
use pvwatch_api::router::build_app_router;
use pvwatch_api::state::AppState;
use pvwatch_api::ws;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pvwatch_api=info,pvwatch_engine=info,pvwatch_gateway=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Fatal start-up error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let monitor = MonitorConfig::load(&config.config_path)?;
    tracing::info!(
        path = %config.config_path,
        targets = monitor.targets.len(),
        master_enable = monitor.master_enable,
        "Loaded target list",
    );

    // --- Watchers ---
    let event_bus = Arc::new(EventBus::default());
    let registry = Arc::new(WatcherRegistry::new(&monitor, Arc::clone(&event_bus))?);

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let stream_handle =
        ws::spawn_event_stream(&event_bus, Arc::clone(&ws_manager), ws::HEARTBEAT_INTERVAL);

    // --- Subscriptions ---
    let adapter: Arc<dyn SubscriptionAdapter> = Arc::new(GatewayAdapter::new(&config.gateway_url));
    registry.start(adapter).await;
    tracing::info!(gateway = %config.gateway_url, "Subscriptions started");

    // --- Router ---
    let state = AppState::new(config.clone(), Arc::clone(&registry), Arc::clone(&ws_manager));
    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| ConfigError::InvalidHost(config.host.clone()))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    registry.shutdown().await;

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    stream_handle.abort();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// If a handler cannot be installed that signal source is ignored.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Server(#[from] ConfigError),

    #[error(transparent)]
    Monitor(#[from] pvwatch_core::error::CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
