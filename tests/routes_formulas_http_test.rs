// ABOUTME: HTTP integration tests for formula and formula line routes
// ABOUTME: Tests authentication, CRUD, recomputed details, error statuses, and reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Formulador Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod helpers;

use axum::http::StatusCode;
use axum::Router;
use helpers::axum_test::AxumTestRequest;
use helpers::{create_test_user, seed_base_catalog, test_app, test_database};
use serde_json::{json, Value};
use uuid::Uuid;

struct Setup {
    app: Router,
    user_id: Uuid,
    other_user_id: Uuid,
}

async fn setup() -> Setup {
    let db = test_database().await;
    seed_base_catalog(&db).await;
    let user_id = create_test_user(&db, "ana@example.com").await;
    let other_user_id = create_test_user(&db, "luis@example.com").await;
    let library = db.reference_library();
    library
        .create(
            "Guía de salchichas",
            Some("libro"),
            "La salchicha viena se embute en tripa fina.",
        )
        .await
        .unwrap();
    library
        .create(
            "Manejo del hielo",
            Some("articulo"),
            "El hielo controla la temperatura de la emulsión.",
        )
        .await
        .unwrap();
    Setup {
        app: test_app(db),
        user_id,
        other_user_id,
    }
}

async fn create_formula(setup: &Setup, name: &str) -> String {
    let body: Value = AxumTestRequest::post("/api/formulas")
        .as_user(setup.user_id)
        .json(&json!({ "product_name": name }))
        .send(setup.app.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    body["id"].as_str().unwrap().to_owned()
}

fn close(a: &Value, b: f64) -> bool {
    (a.as_f64().unwrap() - b).abs() < 1e-9
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_missing_user_header_is_unauthorized() {
    let setup = setup().await;

    let response = AxumTestRequest::get("/api/formulas").send(setup.app).await;

    assert_eq!(response.status(), 401);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_malformed_or_unknown_user_is_unauthorized() {
    let setup = setup().await;

    let response = AxumTestRequest::get("/api/formulas")
        .header("x-user-id", "not-a-uuid")
        .send(setup.app.clone())
        .await;
    assert_eq!(response.status(), 401);

    let response = AxumTestRequest::get("/api/formulas")
        .as_user(Uuid::new_v4())
        .send(setup.app)
        .await;
    assert_eq!(response.status(), 401);
}

// ============================================================================
// Formulas
// ============================================================================

#[tokio::test]
async fn test_create_list_and_duplicate() {
    let setup = setup().await;
    create_formula(&setup, "Salchicha Viena").await;

    let response = AxumTestRequest::post("/api/formulas")
        .as_user(setup.user_id)
        .json(&json!({ "product_name": "SALCHICHA VIENA" }))
        .send(setup.app.clone())
        .await;
    assert_eq!(response.status(), 409);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "RESOURCE_ALREADY_EXISTS");

    let body: Value = AxumTestRequest::get("/api/formulas")
        .as_user(setup.user_id)
        .send(setup.app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["total"], 1);
    assert_eq!(body["formulas"][0]["product_name"], "Salchicha Viena");

    // Formulas are private to their owner
    let body: Value = AxumTestRequest::get("/api/formulas")
        .as_user(setup.other_user_id)
        .send(setup.app)
        .await
        .json();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_rename_and_describe() {
    let setup = setup().await;
    let id = create_formula(&setup, "Chorizo").await;

    let body: Value = AxumTestRequest::put(&format!("/api/formulas/{id}/name"))
        .as_user(setup.user_id)
        .json(&json!({ "new_name": "Chorizo Rojo" }))
        .send(setup.app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["product_name"], "Chorizo Rojo");

    let body: Value = AxumTestRequest::put(&format!("/api/formulas/{id}/description"))
        .as_user(setup.user_id)
        .json(&json!({ "description": "Con pimentón" }))
        .send(setup.app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["description"], "Con pimentón");

    let response = AxumTestRequest::put(&format!("/api/formulas/{id}/name"))
        .as_user(setup.other_user_id)
        .json(&json!({ "new_name": "Robado" }))
        .send(setup.app)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_get_foreign_or_missing_formula_is_not_found() {
    let setup = setup().await;
    let id = create_formula(&setup, "Jamón").await;

    let response = AxumTestRequest::get(&format!("/api/formulas/{id}"))
        .as_user(setup.other_user_id)
        .send(setup.app.clone())
        .await;
    assert_eq!(response.status(), 404);

    let response = AxumTestRequest::get(&format!("/api/formulas/{}", Uuid::new_v4()))
        .as_user(setup.user_id)
        .send(setup.app)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_malformed_ids_use_error_envelope() {
    let setup = setup().await;

    let requests = [
        AxumTestRequest::get("/api/formulas/not-a-uuid"),
        AxumTestRequest::delete("/api/formulas/42"),
        AxumTestRequest::get("/api/formulas/xyz/report"),
        AxumTestRequest::delete("/api/lines/not-a-uuid"),
        AxumTestRequest::delete("/api/ingredients/not-a-uuid"),
        AxumTestRequest::delete("/api/library/not-a-uuid"),
    ];
    for request in requests {
        let response = request.as_user(setup.user_id).send(setup.app.clone()).await;
        assert_eq!(response.status(), 400);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }
}

#[tokio::test]
async fn test_empty_formula_has_zero_totals_and_na_ratios() {
    let setup = setup().await;
    let id = create_formula(&setup, "Vacía").await;

    let body: Value = AxumTestRequest::get(&format!("/api/formulas/{id}"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(body["ingredients"].as_array().unwrap().len(), 0);
    assert!(close(&body["totals"]["total_kg"], 0.0));
    assert!(close(&body["totals"]["cost_per_kg"], 0.0));
    assert_eq!(body["totals"]["water_to_protein_ratio"], "N/A");
    assert_eq!(body["totals"]["fat_to_protein_ratio"], "N/A");
}

#[tokio::test]
async fn test_delete_formula() {
    let setup = setup().await;
    let id = create_formula(&setup, "Paté").await;

    AxumTestRequest::delete(&format!("/api/formulas/{id}"))
        .as_user(setup.user_id)
        .send(setup.app.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = AxumTestRequest::delete(&format!("/api/formulas/{id}"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await;
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Lines
// ============================================================================

#[tokio::test]
async fn test_add_line_returns_recomputed_details() {
    let setup = setup().await;
    let id = create_formula(&setup, "Jamón Cocido").await;

    let body: Value = AxumTestRequest::post(&format!("/api/formulas/{id}/lines"))
        .as_user(setup.user_id)
        .json(&json!({ "name": "pork shoulder", "quantity": "2000", "unit": "g" }))
        .send(setup.app)
        .await
        .assert_status(StatusCode::CREATED)
        .json();

    let line = &body["ingredients"][0];
    assert_eq!(line["name"], "Pork Shoulder");
    assert_eq!(line["category"], "meat");
    assert!(close(&line["kg_total"], 2.0));
    assert!(close(&line["kg_protein"], 0.4));
    assert!(close(&line["line_cost"], 6.0));

    let totals = &body["totals"];
    assert!(close(&totals["total_kg"], 2.0));
    assert!(close(&totals["protein_perc"], 20.0));
    assert!(close(&totals["fat_perc"], 5.0));
    assert!(close(&totals["water_perc"], 0.0));
    assert!(close(&totals["total_retained_water_kg"], 0.2));
    assert!(close(&totals["cost_per_kg"], 3.0));
    assert!(close(&totals["water_to_protein_ratio"], 0.0));
    assert!(close(&totals["fat_to_protein_ratio"], 0.25));
}

#[tokio::test]
async fn test_add_line_validation_errors() {
    let setup = setup().await;
    let id = create_formula(&setup, "Mortadela").await;
    let uri = format!("/api/formulas/{id}/lines");

    for quantity in [json!("abc"), json!(0), json!(-1.5)] {
        let response = AxumTestRequest::post(&uri)
            .as_user(setup.user_id)
            .json(&json!({ "name": "Sal", "quantity": quantity, "unit": "kg" }))
            .send(setup.app.clone())
            .await;
        assert_eq!(response.status(), 400);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "INVALID_QUANTITY");
    }

    let response = AxumTestRequest::post(&uri)
        .as_user(setup.user_id)
        .json(&json!({ "name": "Hielo", "unit": "kg" }))
        .send(setup.app.clone())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_QUANTITY");

    let response = AxumTestRequest::post(&uri)
        .as_user(setup.user_id)
        .json(&json!({ "name": "Carne de Unicornio", "quantity": 1, "unit": "kg" }))
        .send(setup.app.clone())
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INGREDIENT_NOT_FOUND");

    let body: Value = AxumTestRequest::get(&format!("/api/formulas/{id}"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await
        .json();
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_update_and_delete_line() {
    let setup = setup().await;
    let id = create_formula(&setup, "Hamburguesa").await;

    let body: Value = AxumTestRequest::post(&format!("/api/formulas/{id}/lines"))
        .as_user(setup.user_id)
        .json(&json!({ "name": "Carne de Res", "quantity": 3, "unit": "kg" }))
        .send(setup.app.clone())
        .await
        .json();
    let line_id = body["ingredients"][0]["line_id"].as_str().unwrap().to_owned();

    let body: Value = AxumTestRequest::put(&format!("/api/lines/{line_id}"))
        .as_user(setup.user_id)
        .json(&json!({ "name": "Hielo", "quantity": 500, "unit": "g" }))
        .send(setup.app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["ingredients"][0]["name"], "Hielo");
    assert!(close(&body["totals"]["total_kg"], 0.5));
    assert!(close(&body["totals"]["water_perc"], 100.0));
    assert_eq!(body["totals"]["water_to_protein_ratio"], "N/A");

    let response = AxumTestRequest::delete(&format!("/api/lines/{line_id}"))
        .as_user(setup.other_user_id)
        .send(setup.app.clone())
        .await;
    assert_eq!(response.status(), 404);

    let body: Value = AxumTestRequest::delete(&format!("/api/lines/{line_id}"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["ingredients"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_lines_listed_in_category_then_mass_order() {
    let setup = setup().await;
    let id = create_formula(&setup, "Salchicha").await;
    let uri = format!("/api/formulas/{id}/lines");

    for (name, quantity, unit) in [
        ("Sal", 200, "g"),
        ("Hielo", 3, "kg"),
        ("Pork Shoulder", 4, "kg"),
        ("Almidón de Papa", 600, "g"),
        ("Carne de Res", 6, "kg"),
    ] {
        AxumTestRequest::post(&uri)
            .as_user(setup.user_id)
            .json(&json!({ "name": name, "quantity": quantity, "unit": unit }))
            .send(setup.app.clone())
            .await
            .assert_status(StatusCode::CREATED);
    }

    let body: Value = AxumTestRequest::get(&format!("/api/formulas/{id}"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await
        .json();
    let names: Vec<&str> = body["ingredients"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Carne de Res", "Pork Shoulder", "Hielo", "Almidón de Papa", "Sal"]
    );
}

// ============================================================================
// Report
// ============================================================================

#[tokio::test]
async fn test_report_lists_results_and_library_context() {
    let setup = setup().await;
    let id = create_formula(&setup, "Salchicha Viena").await;
    for (name, quantity) in [("Pork Shoulder", 8), ("Hielo", 2)] {
        AxumTestRequest::post(&format!("/api/formulas/{id}/lines"))
            .as_user(setup.user_id)
            .json(&json!({ "name": name, "quantity": quantity, "unit": "kg" }))
            .send(setup.app.clone())
            .await
            .assert_status(StatusCode::CREATED);
    }

    let body: Value = AxumTestRequest::get(&format!("/api/formulas/{id}/report"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let report = body["report"].as_str().unwrap();

    assert!(report.contains("Producto: Salchicha Viena"));
    assert!(report.contains("- Pork Shoulder: 8.000 kg"));
    assert!(report.contains("Peso Total: 10.000 kg"));
    assert!(report.contains("### Guía de salchichas"));
    assert!(!report.contains("### Manejo del hielo"));
}

#[tokio::test]
async fn test_report_context_is_capped_at_two_entries() {
    let setup = setup().await;
    for title in ["Fosfatos", "Tripas"] {
        AxumTestRequest::post("/api/library")
            .as_user(setup.user_id)
            .json(&json!({ "title": title, "content": "Notas sobre la salchicha." }))
            .send(setup.app.clone())
            .await
            .assert_status(StatusCode::CREATED);
    }
    let id = create_formula(&setup, "Salchicha").await;

    let body: Value = AxumTestRequest::get(&format!("/api/formulas/{id}/report"))
        .as_user(setup.user_id)
        .send(setup.app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let report = body["report"].as_str().unwrap();

    assert_eq!(report.matches("### ").count(), 2);
}
