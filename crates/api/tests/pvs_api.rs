//! Integration tests for the PV control surface endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, put_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: GET /api/v1/pvs lists process-wide PVs first, then targets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_pvs_returns_all_names() {
    let app = common::build_test_app(common::test_registry());
    let response = get(app, "/api/v1/pvs").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = json["data"].as_array().unwrap();
    assert_eq!(data.len(), 12);
    assert_eq!(data[0]["name"], "MONITOR:MASTER_ENABLE");
    assert_eq!(data[1]["name"], "MONITOR:SUMMARY_STATUS");
    assert_eq!(data[2]["name"], "SIM:A");
    assert_eq!(data[2]["value"], json!(null));
    assert_eq!(data[2]["writable"], false);
}

// ---------------------------------------------------------------------------
// Test: GET /api/v1/pvs/{name} reads a single PV
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_pv_reads_value() {
    let registry = common::test_registry();
    registry.get("SIM:A").unwrap().on_sample(12.5).await;
    let app = common::build_test_app(registry);

    let json = body_json(get(app.clone(), "/api/v1/pvs/SIM:A").await).await;
    assert_eq!(json["data"]["value"], 12.5);

    let json = body_json(get(app.clone(), "/api/v1/pvs/SIM:A:STATUS").await).await;
    assert_eq!(json["data"]["value"], 1);

    let json = body_json(get(app, "/api/v1/pvs/SIM:A:HIGH").await).await;
    assert_eq!(json["data"]["value"], 20.0);
    assert_eq!(json["data"]["writable"], true);
}

// ---------------------------------------------------------------------------
// Test: unknown PV returns 404 with an error code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_pv_returns_404() {
    let app = common::build_test_app(common::test_registry());
    let response = get(app, "/api/v1/pvs/NOPE").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNKNOWN_PV");
}

// ---------------------------------------------------------------------------
// Test: PUT on a bound recomputes the target verdict
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_bound_recomputes_status() {
    let registry = common::test_registry();
    registry.get("SIM:A").unwrap().on_sample(25.0).await;
    let app = common::build_test_app(registry);

    let json = body_json(get(app.clone(), "/api/v1/pvs/SIM:A:STATUS").await).await;
    assert_eq!(json["data"]["value"], 0);

    let response = put_json(app.clone(), "/api/v1/pvs/SIM:A:HIGH", json!({"value": 30})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["value"], 30.0);

    let json = body_json(get(app, "/api/v1/pvs/SIM:A:STATUS").await).await;
    assert_eq!(json["data"]["value"], 1);
}

// ---------------------------------------------------------------------------
// Test: inverted bounds are rejected and leave the pair unchanged
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_inverted_bound_is_rejected() {
    let app = common::build_test_app(common::test_registry());

    let response = put_json(app.clone(), "/api/v1/pvs/SIM:A:LOW", json!({"value": 50})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_BOUNDS");

    let json = body_json(get(app, "/api/v1/pvs/SIM:A:LOW").await).await;
    assert_eq!(json["data"]["value"], 10.0);
}

// ---------------------------------------------------------------------------
// Test: writes to read-only PVs return 405
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_read_only_returns_405() {
    let app = common::build_test_app(common::test_registry());

    for pv in ["SIM:A", "SIM:A:STATUS", "MONITOR:SUMMARY_STATUS"] {
        let response = put_json(app.clone(), &format!("/api/v1/pvs/{pv}"), json!({"value": 1})).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{pv}");
        assert_eq!(body_json(response).await["code"], "READ_ONLY");
    }
}

// ---------------------------------------------------------------------------
// Test: badly typed values return 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_wrong_type_returns_400() {
    let app = common::build_test_app(common::test_registry());

    let response = put_json(app, "/api/v1/pvs/SIM:A:ENABLE", json!({"value": "yes"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_VALUE");
}

// ---------------------------------------------------------------------------
// Test: master enable write suppresses the summary alarm
// ---------------------------------------------------------------------------

#[tokio::test]
async fn master_enable_write_updates_summary() {
    let app = common::build_test_app(common::test_registry());

    let json = body_json(get(app.clone(), "/api/v1/summary").await).await;
    assert_eq!(json["data"]["status"], "alarm");
    assert_eq!(json["data"]["alarm_count"], 1);

    let response = put_json(
        app.clone(),
        "/api/v1/pvs/MONITOR:MASTER_ENABLE",
        json!({"value": false}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["value"], 0);

    let json = body_json(get(app, "/api/v1/pvs/MONITOR:SUMMARY_STATUS").await).await;
    assert_eq!(json["data"]["value"], 1);
}

// ---------------------------------------------------------------------------
// Test: GET /api/v1/targets returns snapshots in configuration order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_targets_returns_snapshots() {
    let registry = common::test_registry();
    registry.get("SIM:A").unwrap().on_sample(15.0).await;
    let app = common::build_test_app(registry);

    let json = body_json(get(app, "/api/v1/targets").await).await;
    let data = json["data"].as_array().unwrap();

    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["name"], "SIM:A");
    assert_eq!(data[0]["connected"], true);
    assert_eq!(data[0]["value"], 15.0);
    assert_eq!(data[0]["verdict"], "ok");
    assert!(data[0]["last_update"].is_string());
    assert_eq!(data[1]["name"], "SIM:B");
    assert_eq!(data[1]["enabled"], false);
    assert_eq!(data[1]["value"], json!(null));
}
