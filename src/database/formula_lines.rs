// ABOUTME: Units of work that add, update, and delete formula lines
// ABOUTME: Resolves the ingredient and writes the line in one retried transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Formula line mutations
//!
//! Adding or updating a line resolves the ingredient name and writes the line
//! inside the same transaction, so a line can never reference an ingredient
//! copy that failed to commit. The whole unit of work is retried on transient
//! storage errors; logic errors surface on the first attempt.

use super::storage_error;
use super::transactions::{retry_transaction, SqliteTransactionGuard};
use crate::errors::{AppError, AppResult};
use crate::resolver::{IngredientResolver, ResolvedIngredient};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// A persisted formula line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaLine {
    /// Line identifier
    pub id: Uuid,
    /// Parent formula
    pub formula_id: Uuid,
    /// Resolved ingredient
    pub ingredient: ResolvedIngredient,
    /// Unit as entered
    pub unit: String,
}

/// Reject quantities that are not strictly positive finite numbers
///
/// # Errors
///
/// Returns `InvalidQuantity` for zero, negative, NaN or infinite values
pub fn validate_quantity(quantity: f64) -> AppResult<f64> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(quantity)
    } else {
        Err(AppError::invalid_quantity(format!(
            "Quantity must be a positive number, got {quantity}"
        )))
    }
}

fn validate_unit(unit: &str) -> AppResult<&str> {
    let unit = unit.trim();
    if unit.is_empty() {
        Err(AppError::missing_field("unit"))
    } else {
        Ok(unit)
    }
}

/// Formula line operations manager
pub struct FormulaLinesManager {
    pool: SqlitePool,
    max_retries: u32,
}

impl FormulaLinesManager {
    /// Create a new formula lines manager
    #[must_use]
    pub const fn new(pool: SqlitePool, max_retries: u32) -> Self {
        Self { pool, max_retries }
    }

    /// Resolve `name` for the user and append a line to the formula
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` or `MissingRequiredField` before touching storage
    /// - `ResourceNotFound` if the user has no such formula
    /// - `IngredientNotFound` if the name is in neither catalog; no line is written
    pub async fn add_line(
        &self,
        user_id: Uuid,
        formula_id: Uuid,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> AppResult<FormulaLine> {
        let quantity = validate_quantity(quantity)?;
        let unit = validate_unit(unit)?;
        let pool = &self.pool;

        let line = retry_transaction(
            || async move {
                let mut guard = SqliteTransactionGuard::new(
                    pool.begin()
                        .await
                        .map_err(|e| storage_error("Failed to begin transaction", e))?,
                );
                ensure_formula_owned(guard.executor()?, formula_id, user_id).await?;
                let ingredient =
                    IngredientResolver::resolve_or_create(guard.executor()?, name, user_id).await?;

                let line_id = Uuid::new_v4();
                sqlx::query(
                    r"
                    INSERT INTO formula_lines (id, formula_id, user_id, ingredient_id, quantity, unit, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ",
                )
                .bind(line_id.to_string())
                .bind(formula_id.to_string())
                .bind(user_id.to_string())
                .bind(ingredient.id.to_string())
                .bind(quantity)
                .bind(unit)
                .bind(Utc::now().to_rfc3339())
                .execute(guard.executor()?)
                .await
                .map_err(|e| storage_error("Failed to add formula line", e))?;

                guard.commit().await?;
                Ok(FormulaLine {
                    id: line_id,
                    formula_id,
                    ingredient,
                    unit: unit.to_owned(),
                })
            },
            self.max_retries,
        )
        .await?;

        info!(
            user_id = %user_id,
            formula_id = %formula_id,
            ingredient = %line.ingredient.name,
            "Formula line added"
        );
        Ok(line)
    }

    /// Re-resolve `name` and replace the line's ingredient, quantity and unit
    ///
    /// Returns the parent formula id.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_line`], with `ResourceNotFound` for an absent line
    pub async fn update_line(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        name: &str,
        quantity: f64,
        unit: &str,
    ) -> AppResult<Uuid> {
        let quantity = validate_quantity(quantity)?;
        let unit = validate_unit(unit)?;
        let pool = &self.pool;

        let formula_id = retry_transaction(
            || async move {
                let mut guard = SqliteTransactionGuard::new(
                    pool.begin()
                        .await
                        .map_err(|e| storage_error("Failed to begin transaction", e))?,
                );
                let formula_id = line_formula(guard.executor()?, line_id, user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found("Formula line").with_resource_id(line_id.to_string())
                    })?;
                let ingredient =
                    IngredientResolver::resolve_or_create(guard.executor()?, name, user_id).await?;

                sqlx::query(
                    r"
                    UPDATE formula_lines SET ingredient_id = $1, quantity = $2, unit = $3
                    WHERE id = $4 AND user_id = $5
                    ",
                )
                .bind(ingredient.id.to_string())
                .bind(quantity)
                .bind(unit)
                .bind(line_id.to_string())
                .bind(user_id.to_string())
                .execute(guard.executor()?)
                .await
                .map_err(|e| storage_error("Failed to update formula line", e))?;

                guard.commit().await?;
                Ok(formula_id)
            },
            self.max_retries,
        )
        .await?;

        info!(user_id = %user_id, line_id = %line_id, "Formula line updated");
        Ok(formula_id)
    }

    /// Delete a line and return its parent formula id
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user has no such line
    pub async fn delete_line(&self, user_id: Uuid, line_id: Uuid) -> AppResult<Uuid> {
        let pool = &self.pool;
        let formula_id = retry_transaction(
            || async move {
                let formula_id: Option<String> = sqlx::query_scalar(
                    "DELETE FROM formula_lines WHERE id = $1 AND user_id = $2 RETURNING formula_id",
                )
                .bind(line_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(pool)
                .await
                .map_err(|e| storage_error("Failed to delete formula line", e))?;
                formula_id.map(|id| super::parse_uuid(&id)).transpose()
            },
            self.max_retries,
        )
        .await?
        .ok_or_else(|| AppError::not_found("Formula line").with_resource_id(line_id.to_string()))?;

        info!(user_id = %user_id, line_id = %line_id, "Formula line deleted");
        Ok(formula_id)
    }

    /// Parent formula of one of the user's lines
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn formula_id_for_line(&self, user_id: Uuid, line_id: Uuid) -> AppResult<Option<Uuid>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| storage_error("Failed to acquire connection", e))?;
        line_formula(&mut conn, line_id, user_id).await
    }
}

async fn ensure_formula_owned(
    conn: &mut SqliteConnection,
    formula_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM formulas WHERE id = $1 AND user_id = $2")
            .bind(formula_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| storage_error("Failed to look up formula", e))?;

    exists
        .map(|_| ())
        .ok_or_else(|| AppError::not_found("Formula").with_resource_id(formula_id.to_string()))
}

async fn line_formula(
    conn: &mut SqliteConnection,
    line_id: Uuid,
    user_id: Uuid,
) -> AppResult<Option<Uuid>> {
    let formula_id: Option<String> =
        sqlx::query_scalar("SELECT formula_id FROM formula_lines WHERE id = $1 AND user_id = $2")
            .bind(line_id.to_string())
            .bind(user_id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| storage_error("Failed to look up formula line", e))?;

    formula_id.map(|id| super::parse_uuid(&id)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_validate_quantity_rejects_non_positive_values() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = validate_quantity(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidQuantity);
        }
        assert!((validate_quantity(2.5).unwrap() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_unit_requires_text() {
        assert_eq!(validate_unit(" g ").unwrap(), "g");
        assert_eq!(
            validate_unit("  ").unwrap_err().code,
            ErrorCode::MissingRequiredField
        );
    }
}
