// ABOUTME: Server configuration assembled from environment variables
// ABOUTME: Combines network, database, and logging settings into one owned value
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

use super::database::{parse_env, DatabaseConfig};
use crate::constants::network;
use crate::errors::AppResult;
use crate::logging::LoggingConfig;
use std::env;

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP listen port
    pub http_port: u16,
    /// Database settings
    pub database: DatabaseConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: network::DEFAULT_HOST.to_owned(),
            http_port: network::DEFAULT_HTTP_PORT,
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if any variable is set but malformed
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| network::DEFAULT_HOST.to_owned()),
            http_port: parse_env("HTTP_PORT", network::DEFAULT_HTTP_PORT)?,
            database: DatabaseConfig::from_env()?,
            logging: LoggingConfig::from_env(),
        })
    }

    /// Socket address string for the listener
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}
