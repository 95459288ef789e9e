// ABOUTME: HTTP route layer: shared state, acting-user authentication, and router assembly
// ABOUTME: Merges formula, ingredient, library, user, and health routes behind a trace layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! # Routes
//!
//! Each concern owns a `*Routes` type whose `routes(state)` returns a
//! self-contained [`Router`]. [`build`] merges them.
//!
//! Authentication is performed by a collaborator in front of this service,
//! which forwards the acting user's id in the `x-user-id` header. Handlers
//! call [`CurrentUser::authenticate`] to turn that header into a user known
//! to the database.

/// Formula and formula line endpoints
pub mod formulas;
/// Health and readiness endpoints
pub mod health;
/// User ingredient catalog and base catalog endpoints
pub mod ingredients;
/// Reference library endpoints
pub mod library;
/// User registration
pub mod users;

pub use formulas::FormulaRoutes;
pub use health::HealthRoutes;
pub use ingredients::IngredientRoutes;
pub use library::LibraryRoutes;
pub use users::UserRoutes;

use crate::config::ServerConfig;
use crate::constants::network::USER_ID_HEADER;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use axum::{http::HeaderMap, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// State shared by every handler
pub struct AppState {
    /// Owned database handle
    pub database: Database,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Bundle the database handle and configuration
    #[must_use]
    pub fn new(database: Database, config: ServerConfig) -> Self {
        Self {
            database,
            config: Arc::new(config),
        }
    }
}

/// The user on whose behalf a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    /// Registered user id
    pub user_id: Uuid,
}

impl CurrentUser {
    /// Read the acting user from request headers and confirm they exist
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the header is missing, malformed, or names
    /// an unknown user
    pub async fn authenticate(headers: &HeaderMap, state: &AppState) -> AppResult<Self> {
        let raw = headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::auth_required(format!("Missing {USER_ID_HEADER} header")))?;
        let user_id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::auth_required(format!("Malformed {USER_ID_HEADER} header")))?;

        if state.database.users().get_by_id(user_id).await?.is_none() {
            return Err(AppError::auth_required("Unknown user"));
        }
        Ok(Self { user_id })
    }
}

/// Parse a resource id taken from the request path
///
/// # Errors
///
/// Returns `InvalidInput` when `raw` is not a UUID
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::invalid_input(format!("Invalid {what} id: {raw}")))
}

/// Assemble the application router
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&state)))
        .merge(UserRoutes::routes(Arc::clone(&state)))
        .merge(FormulaRoutes::routes(Arc::clone(&state)))
        .merge(IngredientRoutes::routes(Arc::clone(&state)))
        .merge(LibraryRoutes::routes(state))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_parse_id_accepts_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "formula").unwrap(), id);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        let err = parse_id("not-a-uuid", "formula").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(err.message.contains("formula"));
    }
}
