// ABOUTME: Database handle, connection pool setup, and schema migration for formulation data
// ABOUTME: Owns the SQLite pool and hands out per-concern managers that share it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! # Database Management
//!
//! [`Database`] is constructed once at startup and passed to whoever needs
//! storage. There is no process-wide pool: every unit of work borrows a
//! connection from the handle it was given and returns it when the borrow or
//! transaction guard is dropped.

/// System-wide base ingredient catalog
pub mod base_ingredients;
/// Formula lines and the add/update/delete units of work
pub mod formula_lines;
/// Formulas owned by users
pub mod formulas;
/// Per-user ingredient catalogs
pub mod ingredients;
/// Technical reference library with keyword search
pub mod reference_library;
/// Schema creation
mod schema;
/// RAII transaction guard and retry policy
pub mod transactions;
/// Registered users
pub mod users;

pub use base_ingredients::BaseIngredientsManager;
pub use formula_lines::FormulaLinesManager;
pub use formulas::FormulasManager;
pub use ingredients::IngredientsManager;
pub use reference_library::ReferenceLibraryManager;
pub use users::UsersManager;

use crate::config::{DatabaseConfig, DatabaseUrl};
use crate::constants::database::BUSY_TIMEOUT_SECS;
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Owned handle to the relational store
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    max_retries: u32,
}

impl Database {
    /// Open the pool described by `config` and run migrations if enabled
    ///
    /// An in-memory database lives inside its connection, so it gets a pool of
    /// exactly one connection that is never recycled.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated
    pub async fn new(config: &DatabaseConfig) -> AppResult<Self> {
        if let DatabaseUrl::SQLite { path } = &config.url {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::config(format!(
                        "Failed to create database directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let mut options = SqliteConnectOptions::from_str(&config.url.to_connection_string())
            .map_err(|e| AppError::config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let pool_options = if config.url.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to {}: {e}", config.url)))?;

        let db = Self {
            pool,
            max_retries: config.max_retries.max(1),
        };

        if config.auto_migrate {
            db.migrate().await?;
        }

        info!(url = %config.url, "Database ready");
        Ok(db)
    }

    /// Open `url` with default pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unsupported or the database cannot be opened
    pub async fn connect(url: &str) -> AppResult<Self> {
        let config = DatabaseConfig {
            url: DatabaseUrl::parse_url(url)?,
            ..DatabaseConfig::default()
        };
        Self::new(&config).await
    }

    /// Open an in-memory database with the schema applied
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created
    pub async fn in_memory() -> AppResult<Self> {
        Self::new(&DatabaseConfig::in_memory()).await
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Attempts granted to a unit of work that hits transient storage errors
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Create all tables and indexes if they do not exist
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        schema::migrate(&self.pool).await
    }

    /// Round-trip a trivial query, used by readiness checks
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can serve the query
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Readiness check failed", e))?;
        Ok(())
    }

    /// Registered users
    #[must_use]
    pub fn users(&self) -> UsersManager {
        UsersManager::new(self.pool.clone())
    }

    /// System-wide base catalog
    #[must_use]
    pub fn base_ingredients(&self) -> BaseIngredientsManager {
        BaseIngredientsManager::new(self.pool.clone())
    }

    /// Per-user ingredient catalogs
    #[must_use]
    pub fn ingredients(&self) -> IngredientsManager {
        IngredientsManager::new(self.pool.clone())
    }

    /// Formulas
    #[must_use]
    pub fn formulas(&self) -> FormulasManager {
        FormulasManager::new(self.pool.clone())
    }

    /// Formula lines, resolving ingredient names as they are written
    #[must_use]
    pub fn formula_lines(&self) -> FormulaLinesManager {
        FormulaLinesManager::new(self.pool.clone(), self.max_retries)
    }

    /// Technical reference library
    #[must_use]
    pub fn reference_library(&self) -> ReferenceLibraryManager {
        ReferenceLibraryManager::new(self.pool.clone())
    }
}

/// Classify a storage error, prefixing the message with the failed operation
pub(crate) fn storage_error(operation: &str, error: sqlx::Error) -> AppError {
    let mut classified = AppError::from(error);
    classified.message = format!("{operation}: {}", classified.message);
    classified
}

pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))
}

pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
}
