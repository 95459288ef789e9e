// ABOUTME: Database operations for user-owned formulas
// ABOUTME: Handles create, list, rename, delete with cascade, and loading joined line views
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::{parse_timestamp, parse_uuid, storage_error};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{name_key, Category, Formula, FormulaLineView};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// Formula database operations manager
pub struct FormulasManager {
    pool: SqlitePool,
}

impl FormulasManager {
    /// Create a new formulas manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an empty formula
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the user already has a formula with
    /// this product name in any letter case
    pub async fn create(
        &self,
        user_id: Uuid,
        product_name: &str,
        description: Option<&str>,
    ) -> AppResult<Formula> {
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(AppError::missing_field("product_name"));
        }
        let description = description.unwrap_or_default().to_owned();
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO formulas (id, user_id, product_name, product_key, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(product_name)
        .bind(name_key(product_name))
        .bind(&description)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_aware(storage_error("Failed to create formula", e), product_name))?;

        info!(user_id = %user_id, formula_id = %id, "Formula created");

        Ok(Formula {
            id,
            user_id,
            product_name: product_name.to_owned(),
            description,
            created_at: now,
        })
    }

    /// List the user's formulas ordered by product name
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Formula>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, product_name, description, created_at
            FROM formulas WHERE user_id = $1 ORDER BY product_key
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list formulas", e))?;

        rows.iter().map(row_to_formula).collect()
    }

    /// Get one of the user's formulas
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, formula_id: Uuid, user_id: Uuid) -> AppResult<Option<Formula>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, product_name, description, created_at
            FROM formulas WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(formula_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get formula", e))?;

        row.map(|r| row_to_formula(&r)).transpose()
    }

    /// Rename a formula
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the new name is taken by another of
    /// the user's formulas, or `ResourceNotFound` if the formula is absent
    pub async fn rename(&self, formula_id: Uuid, user_id: Uuid, new_name: &str) -> AppResult<Formula> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::missing_field("new_name"));
        }

        let row = sqlx::query(
            r"
            UPDATE formulas SET product_name = $1, product_key = $2
            WHERE id = $3 AND user_id = $4
            RETURNING id, user_id, product_name, description, created_at
            ",
        )
        .bind(new_name)
        .bind(name_key(new_name))
        .bind(formula_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_aware(storage_error("Failed to rename formula", e), new_name))?;

        let Some(row) = row else {
            return Err(AppError::not_found("Formula").with_resource_id(formula_id.to_string()));
        };
        info!(user_id = %user_id, formula_id = %formula_id, "Formula renamed");
        row_to_formula(&row)
    }

    /// Replace a formula's description
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the formula is absent
    pub async fn update_description(
        &self,
        formula_id: Uuid,
        user_id: Uuid,
        description: &str,
    ) -> AppResult<Formula> {
        let row = sqlx::query(
            r"
            UPDATE formulas SET description = $1
            WHERE id = $2 AND user_id = $3
            RETURNING id, user_id, product_name, description, created_at
            ",
        )
        .bind(description)
        .bind(formula_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to update formula description", e))?;

        let Some(row) = row else {
            return Err(AppError::not_found("Formula").with_resource_id(formula_id.to_string()));
        };
        row_to_formula(&row)
    }

    /// Delete a formula and all of its lines
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the formula is absent
    pub async fn delete(&self, formula_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM formulas WHERE id = $1 AND user_id = $2")
            .bind(formula_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete formula", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Formula").with_resource_id(formula_id.to_string()));
        }
        info!(user_id = %user_id, formula_id = %formula_id, "Formula deleted");
        Ok(())
    }

    /// Load a formula's lines joined with their ingredient attributes, in
    /// insertion order
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn load_lines(&self, formula_id: Uuid, user_id: Uuid) -> AppResult<Vec<FormulaLineView>> {
        let rows = sqlx::query(
            r"
            SELECT fl.id AS line_id, fl.quantity, fl.unit,
                   ui.id AS ingredient_id, ui.name AS ingredient_name,
                   ui.protein_percent, ui.fat_percent, ui.water_percent,
                   ui.water_retention_factor, ui.price_per_kg, ui.category
            FROM formula_lines fl
            JOIN user_ingredients ui ON ui.id = fl.ingredient_id AND ui.user_id = fl.user_id
            WHERE fl.formula_id = $1 AND fl.user_id = $2
            ORDER BY fl.rowid
            ",
        )
        .bind(formula_id.to_string())
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to load formula lines", e))?;

        rows.iter().map(row_to_line_view).collect()
    }
}

fn duplicate_aware(err: AppError, product_name: &str) -> AppError {
    if err.code == ErrorCode::ResourceAlreadyExists {
        AppError::duplicate_name(format!("A formula named '{product_name}' already exists"))
    } else {
        err
    }
}

fn row_to_formula(row: &SqliteRow) -> AppResult<Formula> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");
    Ok(Formula {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        product_name: row.get("product_name"),
        description: row.get("description"),
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_line_view(row: &SqliteRow) -> AppResult<FormulaLineView> {
    let line_id: String = row.get("line_id");
    let ingredient_id: String = row.get("ingredient_id");
    let category: String = row.get("category");
    Ok(FormulaLineView {
        line_id: parse_uuid(&line_id)?,
        ingredient_id: parse_uuid(&ingredient_id)?,
        ingredient_name: row.get("ingredient_name"),
        quantity: row.get("quantity"),
        unit: row.get("unit"),
        protein_percent: row.get("protein_percent"),
        fat_percent: row.get("fat_percent"),
        water_percent: row.get("water_percent"),
        water_retention_factor: row.get("water_retention_factor"),
        price_per_kg: row.get("price_per_kg"),
        category: Category::parse(&category),
    })
}
