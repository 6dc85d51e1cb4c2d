//! Integration tests for `/entradas`: registration, pending list, approval.

mod common;

use axum::http::StatusCode;
use common::{
    active_alerts, build_test_app, create_material, expect_json, get, post_json, put,
    seed_parties, stock, today,
};
use serde_json::json;

#[tokio::test]
async fn register_then_approve_adds_stock() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "TOR-001", 10, 0).await;
    create_material(&app, "TOR-002", 0, 0).await;

    let body = expect_json(
        post_json(
            app.clone(),
            "/api/entradas",
            json!({
                "OS": "OS-1001",
                "fecha": today(),
                "proveedor": fx.supplier_id,
                "cliente": fx.client_id,
                "notas": "Entrega parcial",
                "materiales": [
                    { "codigoMaterial": "TOR-001", "cantidad": 5 },
                    { "codigoMaterial": "TOR-002", "cantidad": 12 }
                ]
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let id = body["noEntrada"].as_i64().expect("noEntrada");

    // Registration alone does not move stock.
    assert_eq!(stock(&app, "TOR-001").await, (10, 0));

    let pending = expect_json(get(app.clone(), "/api/entradas/pendientes").await, StatusCode::OK).await;
    assert_eq!(pending[0]["noEntrada"], id);
    assert_eq!(pending[0]["estado"], "PEN");
    assert_eq!(pending[0]["totalMateriales"], 2);
    assert_eq!(pending[0]["nombre"], "Aceros del Norte");

    expect_json(
        put(app.clone(), &format!("/api/entradas/{id}/aprobar")).await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(stock(&app, "TOR-001").await, (15, 0));
    assert_eq!(stock(&app, "TOR-002").await, (12, 0));

    let pending = expect_json(get(app, "/api/entradas/pendientes").await, StatusCode::OK).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn second_approval_is_rejected_and_stock_applied_once() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "CAB-10", 0, 0).await;

    let body = expect_json(
        post_json(
            app.clone(),
            "/api/entradas",
            json!({
                "OS": "OS-7",
                "fecha": today(),
                "proveedor": fx.supplier_id,
                "materiales": [{ "codigoMaterial": "CAB-10", "cantidad": 3 }]
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let id = body["noEntrada"].as_i64().unwrap();
    let uri = format!("/api/entradas/{id}/aprobar");

    expect_json(put(app.clone(), &uri).await, StatusCode::OK).await;
    let error = expect_json(put(app.clone(), &uri).await, StatusCode::BAD_REQUEST).await;
    assert_eq!(error["code"], "INVALID_STATE");

    assert_eq!(stock(&app, "CAB-10").await, (3, 0));
}

#[tokio::test]
async fn approving_unknown_movement_is_not_found() {
    let app = build_test_app();

    let error = expect_json(put(app, "/api/entradas/999/aprobar").await, StatusCode::NOT_FOUND).await;
    assert_eq!(error["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_line_rejects_whole_request() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "TOR-001", 0, 0).await;

    let error = expect_json(
        post_json(
            app.clone(),
            "/api/entradas",
            json!({
                "OS": "OS-2",
                "fecha": today(),
                "proveedor": fx.supplier_id,
                "materiales": [
                    { "codigoMaterial": "TOR-001", "cantidad": 5 },
                    { "codigoMaterial": "TOR-001" }
                ]
            }),
        )
        .await,
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert!(error["detalle"].as_str().unwrap().starts_with("Line 1"));

    let pending = expect_json(get(app, "/api/entradas/pendientes").await, StatusCode::OK).await;
    assert!(pending.as_array().unwrap().is_empty(), "nothing may be created");
}

#[tokio::test]
async fn header_fields_are_required() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;

    let missing_os = json!({
        "fecha": today(),
        "proveedor": fx.supplier_id,
        "materiales": [{ "codigoMaterial": "X", "cantidad": 1 }]
    });
    let response = post_json(app.clone(), "/api/entradas", missing_os).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let empty_lines = json!({
        "OS": "OS-3",
        "fecha": today(),
        "proveedor": fx.supplier_id,
        "materiales": []
    });
    let response = post_json(app.clone(), "/api/entradas", empty_lines).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let no_lines = json!({ "OS": "OS-3", "fecha": today(), "proveedor": fx.supplier_id });
    let response = post_json(app, "/api/entradas", no_lines).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_supplier_or_material_is_not_found() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "TOR-001", 0, 0).await;

    let response = post_json(
        app.clone(),
        "/api/entradas",
        json!({
            "OS": "OS-4",
            "fecha": today(),
            "proveedor": 4040,
            "materiales": [{ "codigoMaterial": "TOR-001", "cantidad": 1 }]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(
        app.clone(),
        "/api/entradas",
        json!({
            "OS": "OS-4",
            "fecha": today(),
            "proveedor": fx.supplier_id,
            "materiales": [
                { "codigoMaterial": "TOR-001", "cantidad": 1 },
                { "codigoMaterial": "NO-EXISTE", "cantidad": 1 }
            ]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let pending = expect_json(get(app, "/api/entradas/pendientes").await, StatusCode::OK).await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn approval_above_minimum_closes_low_stock_alert() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "PIN-5", 2, 5).await;

    let alerts = active_alerts(&app, "PIN-5").await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["tipoAlerta"], "STOCK_BAJO");

    let body = expect_json(
        post_json(
            app.clone(),
            "/api/entradas",
            json!({
                "OS": "OS-9",
                "fecha": today(),
                "proveedor": fx.supplier_id,
                "materiales": [{ "codigoMaterial": "PIN-5", "cantidad": 10 }]
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let id = body["noEntrada"].as_i64().unwrap();
    expect_json(
        put(app.clone(), &format!("/api/entradas/{id}/aprobar")).await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(stock(&app, "PIN-5").await, (12, 0));
    assert!(active_alerts(&app, "PIN-5").await.is_empty());
}

#[tokio::test]
async fn material_search_matches_code_and_description() {
    let app = build_test_app();
    create_material(&app, "TOR-001", 0, 0).await;
    create_material(&app, "CAB-10", 0, 0).await;

    let rows = expect_json(
        get(app.clone(), "/api/entradas/materiales/buscar?search=tor").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["codigoMaterial"], "TOR-001");

    let rows = expect_json(
        get(app, "/api/salidas/material/buscar?search=Material").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(rows.as_array().unwrap().len(), 2);
}
