// ABOUTME: Integration tests for ingredient name resolution against user and base catalogs
// ABOUTME: Covers idempotence, concurrent first-use copies, not-found, and cross-user isolation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

// Test files: allow missing_docs (rustc lint) and unwrap (valid in tests)
#![allow(missing_docs, clippy::unwrap_used)]

mod helpers;

use formulador::config::{DatabaseConfig, DatabaseUrl};
use formulador::database::Database;
use formulador::errors::ErrorCode;
use formulador::models::Category;
use formulador::resolver::IngredientResolver;
use helpers::{
    attributes, create_test_user, seed_base_catalog, test_database, user_ingredient_count,
};

#[tokio::test]
async fn test_first_use_copies_base_entry_with_stored_name() {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    let resolved =
        IngredientResolver::resolve_or_create_standalone(db.pool(), "  pork SHOULDER ", user_id, 3)
            .await
            .unwrap();

    assert!(resolved.copied_from_base);
    assert_eq!(resolved.name, "Pork Shoulder");

    let copy = db.ingredients().get(user_id, resolved.id).await.unwrap().unwrap();
    assert_eq!(copy.attributes.name, "Pork Shoulder");
    assert_eq!(copy.attributes.protein_percent, Some(20.0));
    assert_eq!(copy.attributes.water_retention_factor, Some(0.1));
    assert_eq!(copy.attributes.category, Category::Meat);
}

#[tokio::test]
async fn test_existing_user_ingredient_is_returned_without_new_rows() {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    let first = IngredientResolver::resolve_or_create_standalone(db.pool(), "Hielo", user_id, 3)
        .await
        .unwrap();
    let second = IngredientResolver::resolve_or_create_standalone(db.pool(), "HIELO", user_id, 3)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.copied_from_base);
    assert!(!second.copied_from_base);
    assert_eq!(user_ingredient_count(&db, user_id).await, 1);
}

#[tokio::test]
async fn test_user_catalog_takes_precedence_over_base() {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    let own = db
        .ingredients()
        .create(
            user_id,
            &attributes("sal", Category::Seasoning, 0.0, 0.0, 0.0, 0.9),
        )
        .await
        .unwrap();

    let resolved = IngredientResolver::resolve_or_create_standalone(db.pool(), "Sal", user_id, 3)
        .await
        .unwrap();

    assert_eq!(resolved.id, own.id);
    assert_eq!(resolved.name, "sal");
    assert!(!resolved.copied_from_base);
}

#[tokio::test]
async fn test_unknown_name_fails_and_persists_nothing() {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    let err = IngredientResolver::resolve_or_create_standalone(db.pool(), "Unobtainium", user_id, 3)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::IngredientNotFound);
    assert_eq!(user_ingredient_count(&db, user_id).await, 0);
}

#[tokio::test]
async fn test_blank_name_is_invalid_input() {
    let db = test_database().await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    let err = IngredientResolver::resolve_or_create_standalone(db.pool(), "   ", user_id, 3)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_same_base_entry_gives_independent_rows_per_user() {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let ana = create_test_user(&db, "ana@example.com").await;
    let luis = create_test_user(&db, "luis@example.com").await;

    let for_ana = IngredientResolver::resolve_or_create_standalone(db.pool(), "Pork Shoulder", ana, 3)
        .await
        .unwrap();
    let for_luis =
        IngredientResolver::resolve_or_create_standalone(db.pool(), "Pork Shoulder", luis, 3)
            .await
            .unwrap();

    assert_ne!(for_ana.id, for_luis.id);
    assert!(for_ana.copied_from_base);
    assert!(for_luis.copied_from_base);
    assert_eq!(user_ingredient_count(&db, ana).await, 1);
    assert_eq!(user_ingredient_count(&db, luis).await, 1);
    assert!(db.ingredients().get(ana, for_luis.id).await.unwrap().is_none());
}

async fn race_resolutions(db: &Database, user_id: uuid::Uuid, tasks: usize) {
    let max_retries = db.max_retries();
    let handles: Vec<_> = (0..tasks)
        .map(|i| {
            let db = db.clone();
            let name = if i % 2 == 0 { "pork shoulder" } else { "PORK SHOULDER" };
            tokio::spawn(async move {
                IngredientResolver::resolve_or_create_standalone(
                    db.pool(),
                    name,
                    user_id,
                    max_retries,
                )
                .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    let mut copies = 0;
    for handle in handles {
        let resolved = handle.await.unwrap().unwrap();
        if resolved.copied_from_base {
            copies += 1;
        }
        ids.push(resolved.id);
    }

    assert_eq!(copies, 1, "exactly one resolution should perform the copy");
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(user_ingredient_count(db, user_id).await, 1);
}

#[tokio::test]
async fn test_concurrent_first_use_converges_on_one_row() {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    race_resolutions(&db, user_id, 12).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_use_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: DatabaseUrl::SQLite {
            path: dir.path().join("race.db"),
        },
        max_connections: 4,
        max_retries: 8,
        ..DatabaseConfig::default()
    };
    let db = Database::new(&config).await.unwrap();
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;

    race_resolutions(&db, user_id, 4).await;
}
