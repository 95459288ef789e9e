// ABOUTME: Database configuration types for SQLite connections
// ABOUTME: Parses DATABASE_URL and pool/retry settings from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use crate::constants::database;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns a config error for `PostgreSQL` URLs, which this build does not support
    pub fn parse_url(s: &str) -> AppResult<Self> {
        if s.starts_with("postgresql://") || s.starts_with("postgres://") {
            return Err(AppError::config(
                "PostgreSQL is not supported by this build; use a sqlite: URL",
            ));
        }
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str == ":memory:" || path_str.is_empty() {
                return Ok(Self::Memory);
            }
            return Ok(Self::SQLite {
                path: PathBuf::from(path_str),
            });
        }
        if s == ":memory:" {
            return Ok(Self::Memory);
        }
        // Fallback: treat as SQLite file path
        Ok(Self::SQLite {
            path: PathBuf::from(s),
        })
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from("./data/formulador.db"),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Database connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database location
    pub url: DatabaseUrl,
    /// Maximum pooled connections for file-backed databases
    pub max_connections: u32,
    /// Seconds to wait when acquiring a pooled connection
    pub acquire_timeout_secs: u64,
    /// Attempts for a unit of work that fails with a transient storage error
    pub max_retries: u32,
    /// Create the schema on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DatabaseUrl::default(),
            max_connections: database::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: database::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            max_retries: database::DEFAULT_MAX_RETRIES,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// In-memory configuration, used by tests and tooling
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: DatabaseUrl::Memory,
            ..Self::default()
        }
    }

    /// Load database configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if database environment variables are invalid
    pub fn from_env() -> AppResult<Self> {
        let max_retries: u32 = parse_env("DATABASE_MAX_RETRIES", database::DEFAULT_MAX_RETRIES)?;
        if max_retries == 0 {
            return Err(AppError::config("DATABASE_MAX_RETRIES must be at least 1"));
        }
        Ok(Self {
            url: DatabaseUrl::parse_url(&env_var_or(
                "DATABASE_URL",
                database::DEFAULT_DATABASE_URL,
            ))?,
            max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                database::DEFAULT_MAX_CONNECTIONS,
            )?,
            acquire_timeout_secs: parse_env(
                "DATABASE_ACQUIRE_TIMEOUT_SECS",
                database::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            max_retries,
            auto_migrate: parse_env("AUTO_MIGRATE", true)?,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an optional environment variable, falling back to `default` when unset
pub(crate) fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}
