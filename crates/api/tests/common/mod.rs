#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pvwatch_core::config::{MonitorConfig, TargetDescriptor};
use pvwatch_engine::{EventBus, WatcherRegistry};
use tower::ServiceExt;

use pvwatch_api::config::ServerConfig;
use pvwatch_api::router::build_app_router;
use pvwatch_api::state::AppState;
use pvwatch_api::ws::WsManager;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        config_path: "config.json".to_string(),
        gateway_url: "ws://127.0.0.1:9/pv".to_string(),
    }
}

/// Two targets: `SIM:A` (enabled, 10..20) and `SIM:B` (disabled, 0..1).
pub fn test_registry() -> Arc<WatcherRegistry> {
    let config = MonitorConfig::new(
        true,
        vec![
            TargetDescriptor::new("SIM:A", true, 10.0, 20.0),
            TargetDescriptor::new("SIM:B", false, 0.0, 1.0),
        ],
    );
    Arc::new(WatcherRegistry::new(&config, Arc::new(EventBus::default())).unwrap())
}

/// Build the full application router over `registry`, with the same
/// middleware stack production uses.
pub fn build_test_app(registry: Arc<WatcherRegistry>) -> Router {
    let config = test_config();
    let state = AppState::new(config.clone(), registry, Arc::new(WsManager::new()));
    build_app_router(state, &config).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
