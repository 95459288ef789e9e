// ABOUTME: Shared test helpers and fixtures for integration tests
// ABOUTME: Builds in-memory databases, test users, a seeded base catalog, and the app router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

pub mod axum_test;

use axum::Router;
use formulador::{
    config::ServerConfig,
    database::Database,
    models::{Category, IngredientAttributes},
    routes::{self, AppState},
};
use std::sync::Arc;
use uuid::Uuid;

/// Minimum bcrypt cost keeps user creation fast
pub const TEST_HASH_COST: u32 = 4;

/// Fresh in-memory database with the schema applied
pub async fn test_database() -> Database {
    Database::in_memory()
        .await
        .expect("Failed to create in-memory database")
}

/// Register a user and return their id
pub async fn create_test_user(database: &Database, username: &str) -> Uuid {
    database
        .users()
        .with_hash_cost(TEST_HASH_COST)
        .create(username, "test-password", Some("Test User"))
        .await
        .expect("Failed to create test user")
        .id
}

/// Ingredient attributes with the fields the aggregator reads
pub fn attributes(
    name: &str,
    category: Category,
    protein: f64,
    fat: f64,
    water: f64,
    price: f64,
) -> IngredientAttributes {
    IngredientAttributes {
        name: name.to_owned(),
        protein_percent: Some(protein),
        fat_percent: Some(fat),
        water_percent: Some(water),
        price_per_kg: Some(price),
        category,
        ..IngredientAttributes::default()
    }
}

/// Load a small base catalog
pub async fn seed_base_catalog(database: &Database) {
    let mut pork = attributes("Pork Shoulder", Category::Meat, 20.0, 5.0, 0.0, 3.0);
    pork.water_retention_factor = Some(0.1);
    let records = vec![
        pork,
        attributes("Carne de Res", Category::Meat, 21.0, 8.0, 70.0, 5.5),
        attributes("Hielo", Category::WaterIce, 0.0, 0.0, 100.0, 0.0),
        attributes("Sal", Category::Seasoning, 0.0, 0.0, 0.0, 0.4),
        attributes("Almidón de Papa", Category::Binder, 0.1, 0.0, 12.0, 1.8),
    ];
    database
        .base_ingredients()
        .import_catalog(&records)
        .await
        .expect("Failed to seed base catalog");
}

/// Number of rows in the user's catalog
pub async fn user_ingredient_count(database: &Database, user_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM user_ingredients WHERE user_id = $1")
        .bind(user_id.to_string())
        .fetch_one(database.pool())
        .await
        .expect("Failed to count user ingredients")
}

/// Full application router over `database`
pub fn test_app(database: Database) -> Router {
    test_app_with_config(database, ServerConfig::default())
}

/// Application router over `database` with an explicit configuration
pub fn test_app_with_config(database: Database, config: ServerConfig) -> Router {
    routes::build(Arc::new(AppState::new(database, config)))
}
