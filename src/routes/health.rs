// ABOUTME: Health check route handlers for service monitoring
// ABOUTME: Liveness reports the process is up; readiness round-trips the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::warn;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .route("/ready", get(Self::handle_ready))
            .with_state(state)
    }

    async fn handle_health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
        let logging = &state.config.logging;
        Json(serde_json::json!({
            "status": "healthy",
            "service": logging.service_name,
            "version": logging.service_version,
            "environment": logging.environment,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
        if let Err(e) = state.database.ping().await {
            warn!(error = %e, "Readiness check failed");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
                .into_response();
        }

        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        )
            .into_response()
    }
}
