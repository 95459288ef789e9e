// ABOUTME: Database operations for the system-wide base ingredient catalog
// ABOUTME: Supports case-insensitive lookup, listing, and transactional bulk import
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::transactions::SqliteTransactionGuard;
use super::{parse_uuid, storage_error};
use crate::errors::{AppError, AppResult};
use crate::models::{name_key, BaseIngredient, Category, IngredientAttributes};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

pub(crate) const BASE_COLUMNS: &str = r"
    id, name, protein_percent, fat_percent, water_percent, ve_protein_percent, notes,
    water_retention_factor, min_usage_percent, max_usage_percent, price_per_kg, category
";

/// Base catalog database operations manager
pub struct BaseIngredientsManager {
    pool: SqlitePool,
}

impl BaseIngredientsManager {
    /// Create a new base catalog manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a catalog entry keyed on its case-insensitive name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the database operation fails
    pub async fn upsert(&self, attributes: &IngredientAttributes) -> AppResult<BaseIngredient> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| storage_error("Failed to acquire connection", e))?;
        upsert_on(&mut conn, attributes).await
    }

    /// Upsert every record in one transaction; either all land or none do
    ///
    /// # Errors
    ///
    /// Returns an error if any record is invalid or the database operation fails
    pub async fn import_catalog(&self, records: &[IngredientAttributes]) -> AppResult<usize> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin import", e))?;
        let mut guard = SqliteTransactionGuard::new(tx);

        for record in records {
            upsert_on(guard.executor()?, record).await?;
        }

        guard.commit().await?;
        info!(count = records.len(), "Base catalog imported");
        Ok(records.len())
    }

    /// Find a catalog entry by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_name(&self, name: &str) -> AppResult<Option<BaseIngredient>> {
        let row = sqlx::query(&format!(
            "SELECT {BASE_COLUMNS} FROM base_ingredients WHERE name_key = $1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get base ingredient", e))?;

        row.map(|r| row_to_base_ingredient(&r)).transpose()
    }

    /// List the whole catalog ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list(&self) -> AppResult<Vec<BaseIngredient>> {
        let rows = sqlx::query(&format!(
            "SELECT {BASE_COLUMNS} FROM base_ingredients ORDER BY name_key"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list base ingredients", e))?;

        rows.iter().map(row_to_base_ingredient).collect()
    }
}

async fn upsert_on(
    conn: &mut SqliteConnection,
    attributes: &IngredientAttributes,
) -> AppResult<BaseIngredient> {
    let name = attributes.name.trim();
    if name.is_empty() {
        return Err(AppError::missing_field("name"));
    }

    let row = sqlx::query(&format!(
        r"
        INSERT INTO base_ingredients (
            id, name, name_key, protein_percent, fat_percent, water_percent, ve_protein_percent,
            notes, water_retention_factor, min_usage_percent, max_usage_percent, price_per_kg,
            category, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT(name_key) DO UPDATE SET
            name = excluded.name,
            protein_percent = excluded.protein_percent,
            fat_percent = excluded.fat_percent,
            water_percent = excluded.water_percent,
            ve_protein_percent = excluded.ve_protein_percent,
            notes = excluded.notes,
            water_retention_factor = excluded.water_retention_factor,
            min_usage_percent = excluded.min_usage_percent,
            max_usage_percent = excluded.max_usage_percent,
            price_per_kg = excluded.price_per_kg,
            category = excluded.category,
            updated_at = excluded.updated_at
        RETURNING {BASE_COLUMNS}
        "
    ))
    .bind(Uuid::new_v4().to_string())
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
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| storage_error(&format!("Failed to upsert base ingredient '{name}'"), e))?;

    row_to_base_ingredient(&row)
}

/// Read the attribute columns shared by base and user ingredient rows
pub(crate) fn row_to_attributes(row: &SqliteRow) -> IngredientAttributes {
    let category: String = row.get("category");
    IngredientAttributes {
        name: row.get("name"),
        protein_percent: row.get("protein_percent"),
        fat_percent: row.get("fat_percent"),
        water_percent: row.get("water_percent"),
        ve_protein_percent: row.get("ve_protein_percent"),
        notes: row.get("notes"),
        water_retention_factor: row.get("water_retention_factor"),
        min_usage_percent: row.get("min_usage_percent"),
        max_usage_percent: row.get("max_usage_percent"),
        price_per_kg: row.get("price_per_kg"),
        category: Category::parse(&category),
    }
}

fn row_to_base_ingredient(row: &SqliteRow) -> AppResult<BaseIngredient> {
    let id: String = row.get("id");
    Ok(BaseIngredient {
        id: parse_uuid(&id)?,
        attributes: row_to_attributes(row),
    })
}
