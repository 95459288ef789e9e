// ABOUTME: Route handlers for the per-user ingredient catalog and the base catalog
// ABOUTME: Provides CRUD, name search across both catalogs, and in-use deletion conflicts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::{parse_id, AppState, CurrentUser};
use crate::errors::AppError;
use crate::models::{BaseIngredient, IngredientAttributes, UserIngredient};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Response for listing a user's catalog
#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    /// Ingredients ordered by name
    pub ingredients: Vec<UserIngredient>,
    /// Number of ingredients
    pub total: usize,
}

/// Response for listing the base catalog
#[derive(Debug, Serialize)]
pub struct ListBaseIngredientsResponse {
    /// Base entries ordered by name
    pub ingredients: Vec<BaseIngredient>,
    /// Number of entries
    pub total: usize,
}

/// Query parameters for name search
#[derive(Debug, Deserialize)]
pub struct SearchIngredientsQuery {
    /// Substring to look for
    #[serde(default)]
    pub q: String,
}

/// Response for name search
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchIngredientsResponse {
    /// Matching names, at most ten
    pub names: Vec<String>,
}

/// Ingredient routes implementation
pub struct IngredientRoutes;

impl IngredientRoutes {
    /// Create all ingredient routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route(
                "/api/ingredients",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/ingredients/search", get(Self::handle_search))
            .route(
                "/api/ingredients/:id",
                put(Self::handle_update).delete(Self::handle_delete),
            )
            .route("/api/base-ingredients", get(Self::handle_list_base))
            .with_state(state)
    }

    /// Handle GET /api/ingredients
    async fn handle_list(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let ingredients = state.database.ingredients().list(auth.user_id).await?;

        let response = ListIngredientsResponse {
            total: ingredients.len(),
            ingredients,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/ingredients
    async fn handle_create(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Json(body): Json<IngredientAttributes>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let ingredient = state
            .database
            .ingredients()
            .create(auth.user_id, &body)
            .await?;

        Ok((StatusCode::CREATED, Json(ingredient)).into_response())
    }

    /// Handle PUT /api/ingredients/:id
    async fn handle_update(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
        Json(body): Json<IngredientAttributes>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let ingredient_id = parse_id(&raw_id, "ingredient")?;
        let ingredient = state
            .database
            .ingredients()
            .update(auth.user_id, ingredient_id, &body)
            .await?;

        Ok((StatusCode::OK, Json(ingredient)).into_response())
    }

    /// Handle DELETE /api/ingredients/:id
    async fn handle_delete(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let ingredient_id = parse_id(&raw_id, "ingredient")?;
        state
            .database
            .ingredients()
            .delete(auth.user_id, ingredient_id)
            .await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/ingredients/search
    async fn handle_search(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Query(query): Query<SearchIngredientsQuery>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let names = if query.q.trim().is_empty() {
            Vec::new()
        } else {
            state
                .database
                .ingredients()
                .search_names(auth.user_id, &query.q)
                .await?
        };

        Ok((StatusCode::OK, Json(SearchIngredientsResponse { names })).into_response())
    }

    /// Handle GET /api/base-ingredients
    async fn handle_list_base(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        CurrentUser::authenticate(&headers, &state).await?;
        let ingredients = state.database.base_ingredients().list().await?;

        let response = ListBaseIngredientsResponse {
            total: ingredients.len(),
            ingredients,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
