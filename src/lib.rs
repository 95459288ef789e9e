// ABOUTME: Main library entry point for the Formulador meat-formula service
// ABOUTME: Exposes ingredient resolution, formula aggregation, persistence, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

#![deny(unsafe_code)]

//! # Formulador
//!
//! A multi-tenant service for formulating meat-product recipes. Users keep a
//! private ingredient catalog, compose formulas from ingredient lines, and get
//! nutritional and cost summaries back.
//!
//! ## Architecture
//!
//! - **Resolver**: maps a free-text ingredient name to a per-user ingredient,
//!   copying it from the base catalog on first use
//! - **Aggregator**: pure computation of per-line kilograms, nutrients and
//!   cost, display ordering, and formula totals
//! - **Database**: an explicitly owned `SQLite` handle with one manager per
//!   table group and a retrying transaction helper
//! - **Routes**: axum handlers that call the two core components and map
//!   error kinds to distinct HTTP statuses
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use formulador::database::Database;
//! use formulador::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let database = Database::in_memory().await?;
//!     let user = database.users().create("ana@example.com", "secret", None).await?;
//!     let formula = database.formulas().create(user.id, "Salchicha", None).await?;
//!     let lines = database.formulas().load_lines(formula.id, user.id).await?;
//!     let summary = formulador::aggregator::compute(&lines);
//!     println!("{} kg", summary.totals.total_kg);
//!     Ok(())
//! }
//! ```

/// Formula aggregation over loaded lines
pub mod aggregator;

/// Configuration management
pub mod config;

/// Application constants
pub mod constants;

/// Persistence layer
pub mod database;

/// Unified error handling
pub mod errors;

/// Structured logging setup
pub mod logging;

/// Domain models
pub mod models;

/// Plain-text formula reports
pub mod report;

/// Ingredient name resolution
pub mod resolver;

/// HTTP route layer
pub mod routes;
