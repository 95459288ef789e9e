// ABOUTME: Route handlers for formulas and their ingredient lines
// ABOUTME: Line mutations resolve ingredient names and respond with recomputed formula details
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Formula routes
//!
//! Every line mutation responds with the formula's details recomputed from
//! storage, so the client always renders what was committed.

use super::{parse_id, AppState, CurrentUser};
use crate::aggregator::{self, FormulaTotals, LineProjection};
use crate::constants::limits::REPORT_CONTEXT_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::models::Formula;
use crate::report::render_formula_report;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Formula summary as listed
#[derive(Debug, Serialize, Deserialize)]
pub struct FormulaResponse {
    /// Unique identifier
    pub id: String,
    /// Product name
    pub product_name: String,
    /// Free-text description
    pub description: String,
    /// Creation timestamp
    pub created_at: String,
}

impl From<Formula> for FormulaResponse {
    fn from(formula: Formula) -> Self {
        Self {
            id: formula.id.to_string(),
            product_name: formula.product_name,
            description: formula.description,
            created_at: formula.created_at.to_rfc3339(),
        }
    }
}

/// Response for listing formulas
#[derive(Debug, Serialize, Deserialize)]
pub struct ListFormulasResponse {
    /// The user's formulas
    pub formulas: Vec<FormulaResponse>,
    /// Number of formulas
    pub total: usize,
}

/// A formula with its ordered line projections and totals
#[derive(Debug, Serialize)]
pub struct FormulaDetailsResponse {
    /// Unique identifier
    pub id: String,
    /// Product name
    pub product_name: String,
    /// Free-text description
    pub description: String,
    /// Creation timestamp
    pub created_at: String,
    /// Lines in display order
    pub ingredients: Vec<LineProjection>,
    /// Formula totals, rounded for display
    pub totals: FormulaTotals,
}

/// Request body for creating a formula
#[derive(Debug, Deserialize)]
pub struct CreateFormulaBody {
    /// Product name
    pub product_name: String,
    /// Optional description
    pub description: Option<String>,
}

/// Request body for renaming a formula
#[derive(Debug, Deserialize)]
pub struct RenameFormulaBody {
    /// New product name
    pub new_name: String,
}

/// Request body for replacing a description
#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionBody {
    /// New description
    pub description: String,
}

/// Request body for adding or updating a line
#[derive(Debug, Deserialize)]
pub struct LineBody {
    /// Ingredient name, resolved against the user and base catalogs
    pub name: String,
    /// Positive number, or a string holding one
    #[serde(default)]
    pub quantity: serde_json::Value,
    /// Mass unit, `g` or `kg`
    pub unit: String,
}

/// Response for a formula report
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportResponse {
    /// Plain-text report
    pub report: String,
}

/// Accept a JSON number or a numeric string
///
/// # Errors
///
/// Returns `InvalidQuantity` for anything else
pub fn parse_quantity(value: &serde_json::Value) -> AppResult<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::invalid_quantity(format!("Quantity must be numeric, got {value}")))
}

/// Formula routes implementation
pub struct FormulaRoutes;

impl FormulaRoutes {
    /// Create all formula routes
    pub fn routes(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/api/formulas", get(Self::handle_list).post(Self::handle_create))
            .route(
                "/api/formulas/:id",
                get(Self::handle_get).delete(Self::handle_delete),
            )
            .route("/api/formulas/:id/name", put(Self::handle_rename))
            .route(
                "/api/formulas/:id/description",
                put(Self::handle_update_description),
            )
            .route("/api/formulas/:id/lines", post(Self::handle_add_line))
            .route("/api/formulas/:id/report", get(Self::handle_report))
            .route(
                "/api/lines/:line_id",
                put(Self::handle_update_line).delete(Self::handle_delete_line),
            )
            .with_state(state)
    }

    /// Load a formula and compute its display view
    async fn load_details(
        state: &AppState,
        user_id: Uuid,
        formula_id: Uuid,
    ) -> AppResult<FormulaDetailsResponse> {
        let formulas = state.database.formulas();
        let formula = formulas
            .get(formula_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Formula").with_resource_id(formula_id.to_string()))?;
        let lines = formulas.load_lines(formula_id, user_id).await?;
        let summary = aggregator::compute(&lines).rounded();

        Ok(FormulaDetailsResponse {
            id: formula.id.to_string(),
            product_name: formula.product_name,
            description: formula.description,
            created_at: formula.created_at.to_rfc3339(),
            ingredients: summary.lines,
            totals: summary.totals,
        })
    }

    /// Handle GET /api/formulas
    async fn handle_list(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formulas = state.database.formulas().list(auth.user_id).await?;

        let response = ListFormulasResponse {
            total: formulas.len(),
            formulas: formulas.into_iter().map(Into::into).collect(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/formulas
    async fn handle_create(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Json(body): Json<CreateFormulaBody>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula = state
            .database
            .formulas()
            .create(auth.user_id, &body.product_name, body.description.as_deref())
            .await?;

        Ok((StatusCode::CREATED, Json(FormulaResponse::from(formula))).into_response())
    }

    /// Handle GET /api/formulas/:id
    async fn handle_get(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula_id = parse_id(&raw_id, "formula")?;
        let details = Self::load_details(&state, auth.user_id, formula_id).await?;
        Ok((StatusCode::OK, Json(details)).into_response())
    }

    /// Handle PUT /api/formulas/:id/name
    async fn handle_rename(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
        Json(body): Json<RenameFormulaBody>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula_id = parse_id(&raw_id, "formula")?;
        let formula = state
            .database
            .formulas()
            .rename(formula_id, auth.user_id, &body.new_name)
            .await?;

        Ok((StatusCode::OK, Json(FormulaResponse::from(formula))).into_response())
    }

    /// Handle PUT /api/formulas/:id/description
    async fn handle_update_description(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
        Json(body): Json<UpdateDescriptionBody>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula_id = parse_id(&raw_id, "formula")?;
        let formula = state
            .database
            .formulas()
            .update_description(formula_id, auth.user_id, &body.description)
            .await?;

        Ok((StatusCode::OK, Json(FormulaResponse::from(formula))).into_response())
    }

    /// Handle DELETE /api/formulas/:id
    async fn handle_delete(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula_id = parse_id(&raw_id, "formula")?;
        state
            .database
            .formulas()
            .delete(formula_id, auth.user_id)
            .await?;
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/formulas/:id/lines
    async fn handle_add_line(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
        Json(body): Json<LineBody>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula_id = parse_id(&raw_id, "formula")?;
        let quantity = parse_quantity(&body.quantity)?;
        state
            .database
            .formula_lines()
            .add_line(auth.user_id, formula_id, &body.name, quantity, &body.unit)
            .await?;

        let details = Self::load_details(&state, auth.user_id, formula_id).await?;
        Ok((StatusCode::CREATED, Json(details)).into_response())
    }

    /// Handle PUT /api/lines/:line_id
    async fn handle_update_line(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
        Json(body): Json<LineBody>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let line_id = parse_id(&raw_id, "line")?;
        let quantity = parse_quantity(&body.quantity)?;
        let formula_id = state
            .database
            .formula_lines()
            .update_line(auth.user_id, line_id, &body.name, quantity, &body.unit)
            .await?;

        let details = Self::load_details(&state, auth.user_id, formula_id).await?;
        Ok((StatusCode::OK, Json(details)).into_response())
    }

    /// Handle DELETE /api/lines/:line_id
    async fn handle_delete_line(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let line_id = parse_id(&raw_id, "line")?;
        let formula_id = state
            .database
            .formula_lines()
            .delete_line(auth.user_id, line_id)
            .await?;

        let details = Self::load_details(&state, auth.user_id, formula_id).await?;
        Ok((StatusCode::OK, Json(details)).into_response())
    }

    /// Handle GET /api/formulas/:id/report
    async fn handle_report(
        State(state): State<Arc<AppState>>,
        headers: HeaderMap,
        Path(raw_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = CurrentUser::authenticate(&headers, &state).await?;
        let formula_id = parse_id(&raw_id, "formula")?;
        let formulas = state.database.formulas();
        let formula = formulas
            .get(formula_id, auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Formula").with_resource_id(formula_id.to_string()))?;
        let summary = aggregator::compute(&formulas.load_lines(formula_id, auth.user_id).await?);

        let references = state
            .database
            .reference_library()
            .search(&formula.product_name, Some(REPORT_CONTEXT_LIMIT))
            .await?;
        let report = render_formula_report(&formula.product_name, &summary, &references);

        Ok((StatusCode::OK, Json(ReportResponse { report })).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_quantity_accepts_numbers_and_numeric_strings() {
        assert!((parse_quantity(&json!(250)).unwrap() - 250.0).abs() < f64::EPSILON);
        assert!((parse_quantity(&json!(" 1.5 ")).unwrap() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_quantity_rejects_other_values() {
        for value in [json!("abc"), json!(true), json!(null), json!([1])] {
            assert_eq!(
                parse_quantity(&value).unwrap_err().code,
                ErrorCode::InvalidQuantity
            );
        }
    }
}
