// ABOUTME: Route handler for user registration
// ABOUTME: Stores a bcrypt-hashed account and returns the new user id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::AppState;
use crate::errors::AppError;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    /// Login name
    pub username: String,
    /// Plain-text password, hashed before storage
    pub password: String,
    /// Display name
    pub full_name: Option<String>,
}

/// Response for a successful registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user id, sent as `x-user-id` on later requests
    pub user_id: String,
    /// Stored login name
    pub username: String,
}

/// User routes implementation
pub struct UserRoutes;

impl UserRoutes {
    /// Create all user routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/users", post(Self::handle_register))
            .with_state(state)
    }

    /// Handle POST /api/users
    async fn handle_register(
        State(state): State<Arc<AppState>>,
        Json(body): Json<RegisterBody>,
    ) -> Result<Response, AppError> {
        let user = state
            .database
            .users()
            .create(&body.username, &body.password, body.full_name.as_deref())
            .await?;

        let response = RegisterResponse {
            user_id: user.id.to_string(),
            username: user.username,
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }
}
