// ABOUTME: Route handlers for the technical reference library
// ABOUTME: Provides CRUD and keyword search used to build formula report context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::{parse_id, AppState, CurrentUser};
use crate::errors::AppError;
use crate::models::ReferenceEntry;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for creating or replacing an entry
#[derive(Debug, Deserialize)]
pub struct ReferenceEntryBody {
    /// Title
    pub title: String,
    /// Kind of source
    pub kind: Option<String>,
    /// Body text
    pub content: String,
}

/// Query parameters for keyword search
#[derive(Debug, Deserialize)]
pub struct SearchLibraryQuery {
    /// Free-text question
    #[serde(default)]
    pub q: String,
    /// Maximum entries to return
    pub limit: Option<i64>,
}

/// Response for listing or searching entries
#[derive(Debug, Serialize, Deserialize)]
pub struct ListReferencesResponse {
    /// Matching entries
    pub entries: Vec<ReferenceEntry>,
    /// Number of entries returned
    pub total: usize,
}

impl From<Vec<ReferenceEntry>> for ListReferencesResponse {
    fn from(entries: Vec<ReferenceEntry>) -> Self {
        Self {
            total: entries.len(),
            entries,
        }
    }
}

/// Reference library routes implementation
pub struct LibraryRoutes;

impl LibraryRoutes {
    /// Create all library routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/library", get(Self::handle_list).post(Self::handle_create))
            .route("/api/library/search", get(Self::handle_search))
            .route(
                "/api/library/:id",
                put(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(state)
    }

    /// Handle GET /api/library
    async fn handle_list(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        CurrentUser::authenticate(&headers, &state).await?;
        let entries = state.database.reference_library().list().await?;
        Ok((StatusCode::OK, Json(ListReferencesResponse::from(entries))).into_response())
    }

    /// Handle POST /api/library
    async fn handle_create(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Json(body): Json<ReferenceEntryBody>,
    ) -> Result<Response, AppError> {
        CurrentUser::authenticate(&headers, &state).await?;
        let entry = state
            .database
            .reference_library()
            .create(&body.title, body.kind.as_deref(), &body.content)
            .await?;
        Ok((StatusCode::CREATED, Json(entry)).into_response())
    }

    /// Handle PUT /api/library/:id
    async fn handle_update(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
        Json(body): Json<ReferenceEntryBody>,
    ) -> Result<Response, AppError> {
        CurrentUser::authenticate(&headers, &state).await?;
        let entry_id = parse_id(&raw_id, "reference entry")?;
        let entry = state
            .database
            .reference_library()
            .update(entry_id, &body.title, body.kind.as_deref(), &body.content)
            .await?;
        Ok((StatusCode::OK, Json(entry)).into_response())
    }

    /// Handle DELETE /api/library/:id
    async fn handle_delete(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
    ) -> Result<Response, AppError> {
        CurrentUser::authenticate(&headers, &state).await?;
        let entry_id = parse_id(&raw_id, "reference entry")?;
        state.database.reference_library().delete(entry_id).await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/library/search
    async fn handle_search(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Query(query): Query<SearchLibraryQuery>,
    ) -> Result<Response, AppError> {
        CurrentUser::authenticate(&headers, &state).await?;
        let entries = state
            .database
            .reference_library()
            .search(&query.q, query.limit)
            .await?;
        Ok((StatusCode::OK, Json(ListReferencesResponse::from(entries))).into_response())
    }
}
