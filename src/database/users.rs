// ABOUTME: Database operations for registered users
// ABOUTME: Creates users with bcrypt password hashes, looks them up, and deletes them with cascade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::{parse_timestamp, parse_uuid, storage_error};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::User;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

/// User database operations manager
pub struct UsersManager {
    pool: SqlitePool,
    hash_cost: u32,
}

impl UsersManager {
    /// Create a new users manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor (minimum 4); tests use the minimum
    #[must_use]
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Register a user, storing only a bcrypt hash of the password
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the username is taken, or
    /// `MissingRequiredField` for a blank username or password
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> AppResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::missing_field("username"));
        }
        if password.is_empty() {
            return Err(AppError::missing_field("password"));
        }

        let password_hash = bcrypt::hash(password, self.hash_cost)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO users (id, username, password_hash, full_name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id.to_string())
        .bind(username)
        .bind(&password_hash)
        .bind(full_name)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match storage_error("Failed to create user", e) {
            err if err.code == ErrorCode::ResourceAlreadyExists => {
                AppError::duplicate_name(format!("Username '{username}' is already registered"))
            }
            err => err,
        })?;

        info!(user_id = %id, "User registered");

        Ok(User {
            id,
            username: username.to_owned(),
            full_name: full_name.map(str::to_owned),
            password_hash,
            created_at: now,
        })
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, full_name, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get user", e))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Get a user by username (case-insensitive)
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, full_name, created_at FROM users WHERE username = $1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to get user", e))?;

        row.map(|r| row_to_user(&r)).transpose()
    }

    /// Check a password against the stored hash
    ///
    /// Returns `None` for an unknown user or a wrong password alike.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails or the stored hash is corrupt
    pub async fn verify_password(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };
        let valid = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))?;
        Ok(valid.then_some(user))
    }

    /// Delete a user together with their ingredients, formulas and lines
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn delete(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    Ok(User {
        id: parse_uuid(&id)?,
        username: row.get("username"),
        full_name: row.get("full_name"),
        password_hash: row.get("password_hash"),
        created_at: parse_timestamp(&created_at)?,
    })
}
