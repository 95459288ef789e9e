// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Exposes environment-driven server and database configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Configuration is read from environment variables only; binaries may
//! override individual values from command-line flags.

/// Database location, pool sizing, and retry bound
pub mod database;
/// Server configuration from environment variables
pub mod environment;

pub use database::{DatabaseConfig, DatabaseUrl};
pub use environment::ServerConfig;
