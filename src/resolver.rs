// ABOUTME: Resolves a free-text ingredient name to a stable per-user ingredient identity
// ABOUTME: Copies base catalog entries into the user's catalog on first use, race-safely
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! # Ingredient Resolver
//!
//! Resolution order for a name, compared without regard to case:
//!
//! 1. the user's own catalog;
//! 2. the base catalog, whose entry is copied into the user's catalog under
//!    the base entry's exact stored name.
//!
//! The copy is an `INSERT … ON CONFLICT DO NOTHING` followed by an
//! unconditional re-read. Two requests racing to copy the same entry for the
//! same user both end up with the single row that won, and neither sees a
//! constraint error.

use crate::database::storage_error;
use crate::database::transactions::{retry_transaction, SqliteTransactionGuard};
use crate::errors::{AppError, AppResult};
use crate::models::name_key;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIngredient {
    /// User ingredient identifier
    pub id: Uuid,
    /// Stored display name
    pub name: String,
    /// Whether this call's copy from the base catalog took effect
    pub copied_from_base: bool,
}

/// Name-to-identity resolution against the user and base catalogs
pub struct IngredientResolver;

impl IngredientResolver {
    /// Resolve `name` for `user_id` on a connection the caller controls
    ///
    /// Pass the connection of an open transaction so the copy and whatever the
    /// caller writes next commit or roll back together.
    ///
    /// # Errors
    ///
    /// - `IngredientNotFound` if neither catalog has the name; nothing is written
    /// - `InvalidInput` for a blank name
    /// - storage errors, classified for retry
    pub async fn resolve_or_create(
        conn: &mut SqliteConnection,
        name: &str,
        user_id: Uuid,
    ) -> AppResult<ResolvedIngredient> {
        let key = name_key(name);
        if key.is_empty() {
            return Err(AppError::invalid_input("Ingredient name must not be empty"));
        }
        let owner = user_id.to_string();

        if let Some(existing) = find_user_ingredient(conn, &owner, &key).await? {
            debug!(user_id = %user_id, ingredient = %existing.name, "Resolved from user catalog");
            return Ok(existing);
        }

        let base_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM base_ingredients WHERE name_key = $1")
                .bind(&key)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| storage_error("Failed to look up base ingredient", e))?;
        let Some(base_id) = base_id else {
            return Err(AppError::ingredient_not_found(name.trim()));
        };

        let now = Utc::now().to_rfc3339();
        let inserted = sqlx::query(
            r"
            INSERT INTO user_ingredients (
                id, user_id, name, name_key, protein_percent, fat_percent, water_percent,
                ve_protein_percent, notes, water_retention_factor, min_usage_percent,
                max_usage_percent, price_per_kg, category, created_at, updated_at
            )
            SELECT $1, $2, name, name_key, protein_percent, fat_percent, water_percent,
                   ve_protein_percent, notes, water_retention_factor, min_usage_percent,
                   max_usage_percent, price_per_kg, category, $3, $3
            FROM base_ingredients
            WHERE id = $4
            ON CONFLICT(user_id, name_key) DO NOTHING
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&owner)
        .bind(&now)
        .bind(&base_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| storage_error("Failed to copy base ingredient", e))?
        .rows_affected();

        // Re-read regardless: a concurrent writer may own the row we converge on.
        let mut resolved = find_user_ingredient(conn, &owner, &key)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Ingredient '{}' missing after copy from base catalog",
                    name.trim()
                ))
            })?;
        resolved.copied_from_base = inserted == 1;

        if resolved.copied_from_base {
            info!(user_id = %user_id, ingredient = %resolved.name, "Copied base ingredient into user catalog");
        }
        Ok(resolved)
    }

    /// Resolve in a transaction of its own, retrying transient storage errors
    ///
    /// # Errors
    ///
    /// Same as [`Self::resolve_or_create`]; transient errors surface only
    /// after `max_retries` attempts
    pub async fn resolve_or_create_standalone(
        pool: &SqlitePool,
        name: &str,
        user_id: Uuid,
        max_retries: u32,
    ) -> AppResult<ResolvedIngredient> {
        retry_transaction(
            || async move {
                let tx = pool
                    .begin()
                    .await
                    .map_err(|e| storage_error("Failed to begin transaction", e))?;
                let mut guard = SqliteTransactionGuard::new(tx);
                let resolved = Self::resolve_or_create(guard.executor()?, name, user_id).await?;
                guard.commit().await?;
                Ok(resolved)
            },
            max_retries,
        )
        .await
    }
}

async fn find_user_ingredient(
    conn: &mut SqliteConnection,
    owner: &str,
    key: &str,
) -> AppResult<Option<ResolvedIngredient>> {
    let row = sqlx::query("SELECT id, name FROM user_ingredients WHERE user_id = $1 AND name_key = $2")
        .bind(owner)
        .bind(key)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| storage_error("Failed to look up user ingredient", e))?;

    row.map(|r| -> AppResult<ResolvedIngredient> {
        let id: String = r.get("id");
        Ok(ResolvedIngredient {
            id: crate::database::parse_uuid(&id)?,
            name: r.get("name"),
            copied_from_base: false,
        })
    })
    .transpose()
}
