// ABOUTME: Idempotent schema creation for users, ingredients, formulas, lines, and references
// ABOUTME: Encodes per-user name uniqueness and same-owner line references as constraints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

//! Every formula line carries its owner's `user_id` and references both its
//! formula and its ingredient through composite `(id, user_id)` keys. A line
//! can therefore only point at an ingredient owned by the same user as its
//! formula, whatever the application code does.
//!
//! The ingredient reference has no `ON DELETE` action: deleting an ingredient
//! still used by a line fails with a foreign-key violation, while deleting a
//! user removes formulas, lines and ingredients in one cascading statement.

use super::storage_error;
use crate::errors::AppResult;
use sqlx::SqlitePool;

const USERS: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    full_name TEXT,
    created_at TEXT NOT NULL
)
";

const BASE_INGREDIENTS: &str = r"
CREATE TABLE IF NOT EXISTS base_ingredients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL UNIQUE,
    protein_percent REAL,
    fat_percent REAL,
    water_percent REAL,
    ve_protein_percent REAL,
    notes TEXT,
    water_retention_factor REAL,
    min_usage_percent REAL,
    max_usage_percent REAL,
    price_per_kg REAL,
    category TEXT NOT NULL DEFAULT 'binder',
    updated_at TEXT NOT NULL
)
";

const USER_INGREDIENTS: &str = r"
CREATE TABLE IF NOT EXISTS user_ingredients (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    name_key TEXT NOT NULL,
    protein_percent REAL,
    fat_percent REAL,
    water_percent REAL,
    ve_protein_percent REAL,
    notes TEXT,
    water_retention_factor REAL,
    min_usage_percent REAL,
    max_usage_percent REAL,
    price_per_kg REAL,
    category TEXT NOT NULL DEFAULT 'binder',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, name_key),
    UNIQUE (id, user_id)
)
";

const FORMULAS: &str = r"
CREATE TABLE IF NOT EXISTS formulas (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    product_name TEXT NOT NULL,
    product_key TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    UNIQUE (user_id, product_key),
    UNIQUE (id, user_id)
)
";

const FORMULA_LINES: &str = r"
CREATE TABLE IF NOT EXISTS formula_lines (
    id TEXT PRIMARY KEY,
    formula_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    ingredient_id TEXT NOT NULL,
    quantity REAL NOT NULL CHECK (quantity > 0),
    unit TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (formula_id, user_id) REFERENCES formulas(id, user_id) ON DELETE CASCADE,
    FOREIGN KEY (ingredient_id, user_id) REFERENCES user_ingredients(id, user_id)
)
";

const REFERENCE_ENTRIES: &str = r"
CREATE TABLE IF NOT EXISTS reference_entries (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    kind TEXT,
    content TEXT NOT NULL,
    content_key TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_user_ingredients_user ON user_ingredients(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_formulas_user ON formulas(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_formula_lines_formula ON formula_lines(formula_id, user_id)",
    "CREATE INDEX IF NOT EXISTS idx_formula_lines_ingredient ON formula_lines(ingredient_id, user_id)",
];

/// Create every table and index; safe to run on each startup
pub(super) async fn migrate(pool: &SqlitePool) -> AppResult<()> {
    for (table, ddl) in [
        ("users", USERS),
        ("base_ingredients", BASE_INGREDIENTS),
        ("user_ingredients", USER_INGREDIENTS),
        ("formulas", FORMULAS),
        ("formula_lines", FORMULA_LINES),
        ("reference_entries", REFERENCE_ENTRIES),
    ] {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| storage_error(&format!("Failed to create table {table}"), e))?;
    }

    for ddl in INDEXES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| storage_error("Failed to create index", e))?;
    }

    Ok(())
}
