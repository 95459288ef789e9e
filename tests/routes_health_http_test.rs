// ABOUTME: HTTP integration tests for health check routes
// ABOUTME: Tests liveness and database-backed readiness without authentication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use helpers::axum_test::AxumTestRequest;
use formulador::config::ServerConfig;
use helpers::{test_app, test_app_with_config, test_database};

// ============================================================================
// GET /health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint_success() {
    let app = test_app(test_database().await);

    let response = AxumTestRequest::get("/health").send(app).await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "formulador-server");
    assert!(body["version"].is_string());
    assert_eq!(body["environment"], "development");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_reports_configured_environment() {
    let mut config = ServerConfig::default();
    config.logging.environment = "production".to_owned();
    config.logging.service_version = "9.9.9".to_owned();
    let app = test_app_with_config(test_database().await, config);

    let body: serde_json::Value = AxumTestRequest::get("/health").send(app).await.json();

    assert_eq!(body["environment"], "production");
    assert_eq!(body["version"], "9.9.9");
}

// ============================================================================
// GET /ready
// ============================================================================

#[tokio::test]
async fn test_ready_endpoint_with_open_database() {
    let app = test_app(test_database().await);

    let response = AxumTestRequest::get("/ready").send(app).await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_ready_endpoint_reports_closed_database() {
    let db = test_database().await;
    db.pool().close().await;
    let app = test_app(db);

    let response = AxumTestRequest::get("/ready").send(app).await;

    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "unavailable");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app(test_database().await);

    let response = AxumTestRequest::get("/nonexistent").send(app).await;

    assert_eq!(response.status(), 404);
}
