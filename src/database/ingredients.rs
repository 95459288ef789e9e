// ABOUTME: Database operations for per-user ingredient catalogs
// ABOUTME: Handles CRUD with per-user name uniqueness, in-use protection, and name search
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::base_ingredients::row_to_attributes;
use super::{parse_timestamp, parse_uuid, storage_error};
use crate::constants::limits::INGREDIENT_SEARCH_LIMIT;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::{name_key, IngredientAttributes, UserIngredient};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

const USER_COLUMNS: &str = r"
    id, user_id, name, protein_percent, fat_percent, water_percent, ve_protein_percent, notes,
    water_retention_factor, min_usage_percent, max_usage_percent, price_per_kg, category,
    created_at
";

/// User ingredient catalog operations manager
pub struct IngredientsManager {
    pool: SqlitePool,
}

impl IngredientsManager {
    /// Create a new ingredients manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add an ingredient to the user's catalog
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the user already has an ingredient
    /// with this name in any letter case
    pub async fn create(
        &self,
        user_id: Uuid,
        attributes: &IngredientAttributes,
    ) -> AppResult<UserIngredient> {
        let name = attributes.name.trim();
        if name.is_empty() {
            return Err(AppError::missing_field("name"));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO user_ingredients (
                id, user_id, name, name_key, protein_percent, fat_percent, water_percent,
                ve_protein_percent, notes, water_retention_factor, min_usage_percent,
                max_usage_percent, price_per_kg, category, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(name)
        .bind(name_key(name))
        .bind(attributes.protein_percent)
        .bind(attributes.fat_percent)
        .bind(attributes.water_percent)
        .bind(attributes.ve_protein_percent)
        .bind(&attributes.notes)
        .bind(attributes.water_retention_factor)
        .bind(attributes.min_usage_percent)
        .bind(attributes.max_usage_percent)
        .bind(attributes.price_per_kg)
        .bind(attributes.category.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_aware(storage_error("Failed to create ingredient", e), name))?;

        info!(user_id = %user_id, ingredient = %name, "Ingredient created");

        Ok(UserIngredient {
            id,
            user_id,
            attributes: IngredientAttributes {
                name: name.to_owned(),
                ..attributes.clone()
            },
            created_at: now,
        })
    }

    /// Get one of the user's ingredients
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get(&self, user_id: Uuid, ingredient_id: Uuid) -> AppResult<Option<UserIngredient>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM user_ingredients WHERE id = $1 AND user_id = $2"
        ))
        .bind(ingredient_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get ingredient", e))?;

        row.map(|r| row_to_user_ingredient(&r)).transpose()
    }

    /// List the user's catalog ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<UserIngredient>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM user_ingredients WHERE user_id = $1 ORDER BY name_key"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list ingredients", e))?;

        rows.iter().map(row_to_user_ingredient).collect()
    }

    /// Replace every attribute of one of the user's ingredients
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user has no such ingredient, or
    /// `ResourceAlreadyExists` if the new name clashes with another one
    pub async fn update(
        &self,
        user_id: Uuid,
        ingredient_id: Uuid,
        attributes: &IngredientAttributes,
    ) -> AppResult<UserIngredient> {
        let name = attributes.name.trim();
        if name.is_empty() {
            return Err(AppError::missing_field("name"));
        }

        let row = sqlx::query(&format!(
            r"
            UPDATE user_ingredients SET
                name = $1, name_key = $2, protein_percent = $3, fat_percent = $4,
                water_percent = $5, ve_protein_percent = $6, notes = $7,
                water_retention_factor = $8, min_usage_percent = $9, max_usage_percent = $10,
                price_per_kg = $11, category = $12, updated_at = $13
            WHERE id = $14 AND user_id = $15
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(name_key(name))
        .bind(attributes.protein_percent)
        .bind(attributes.fat_percent)
        .bind(attributes.water_percent)
        .bind(attributes.ve_protein_percent)
        .bind(&attributes.notes)
        .bind(attributes.water_retention_factor)
        .bind(attributes.min_usage_percent)
        .bind(attributes.max_usage_percent)
        .bind(attributes.price_per_kg)
        .bind(attributes.category.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(ingredient_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| duplicate_aware(storage_error("Failed to update ingredient", e), name))?;

        let Some(row) = row else {
            return Err(AppError::not_found("Ingredient").with_resource_id(ingredient_id.to_string()));
        };
        row_to_user_ingredient(&row)
    }

    /// Delete one of the user's ingredients
    ///
    /// Deletion is refused while any formula line references the ingredient;
    /// lines are never removed as a side effect.
    ///
    /// # Errors
    ///
    /// Returns `ResourceInUse` if a formula line references the ingredient, or
    /// `ResourceNotFound` if the user has no such ingredient
    pub async fn delete(&self, user_id: Uuid, ingredient_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM user_ingredients WHERE id = $1 AND user_id = $2")
            .bind(ingredient_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| match storage_error("Failed to delete ingredient", e) {
                err if err.code == ErrorCode::ResourceInUse => AppError::in_use(
                    "Ingredient is used by at least one formula and cannot be deleted",
                )
                .with_resource_id(ingredient_id.to_string()),
                err => err,
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Ingredient").with_resource_id(ingredient_id.to_string()));
        }
        info!(user_id = %user_id, ingredient_id = %ingredient_id, "Ingredient deleted");
        Ok(())
    }

    /// Names containing `query`, ignoring case, from the user's catalog and
    /// the base catalog
    ///
    /// A name present in both catalogs is listed once, spelled as in the
    /// user's catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn search_names(&self, user_id: Uuid, query: &str) -> AppResult<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            r"
            SELECT name FROM (
                SELECT u.name AS name, u.name_key AS name_key
                FROM user_ingredients u
                WHERE u.user_id = $1 AND instr(u.name_key, $2) > 0
                UNION ALL
                SELECT b.name AS name, b.name_key AS name_key
                FROM base_ingredients b
                WHERE instr(b.name_key, $2) > 0
                  AND NOT EXISTS (
                      SELECT 1 FROM user_ingredients u2
                      WHERE u2.user_id = $1 AND u2.name_key = b.name_key
                  )
            )
            ORDER BY name_key
            LIMIT $3
            ",
        )
        .bind(user_id.to_string())
        .bind(name_key(query))
        .bind(INGREDIENT_SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to search ingredients", e))?;

        Ok(names)
    }
}

fn duplicate_aware(err: AppError, name: &str) -> AppError {
    if err.code == ErrorCode::ResourceAlreadyExists {
        AppError::duplicate_name(format!("An ingredient named '{name}' already exists"))
    } else {
        err
    }
}

fn row_to_user_ingredient(row: &SqliteRow) -> AppResult<UserIngredient> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");
    Ok(UserIngredient {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        attributes: row_to_attributes(row),
        created_at: parse_timestamp(&created_at)?,
    })
}
