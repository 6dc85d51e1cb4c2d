//! Integration tests for `/alertas`.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{
    active_alerts, build_test_app, create_material, expect_json, get, post_json, put,
    seed_parties, today,
};
use serde_json::{json, Value};

async fn alerts(app: &Router, query: &str) -> Vec<Value> {
    let body = expect_json(
        get(app.clone(), &format!("/api/alertas{query}")).await,
        StatusCode::OK,
    )
    .await;
    body["alertas"].as_array().expect("alertas array").clone()
}

async fn seed_alerts(app: &Router) {
    create_material(app, "LOW", 3, 5).await;
    create_material(app, "EMPTY", 0, 5).await;
    create_material(app, "OK", 10, 5).await;
}

#[tokio::test]
async fn materials_below_minimum_get_one_active_alert() {
    let app = build_test_app();
    seed_alerts(&app).await;

    let all = alerts(&app, "").await;
    assert_eq!(all.len(), 2);

    let low = active_alerts(&app, "LOW").await;
    assert_eq!(low.len(), 1);
    assert_eq!(low[0]["tipoAlerta"], "STOCK_BAJO");
    assert_eq!(low[0]["stockActual"], 3);
    assert_eq!(low[0]["stockMinimo"], 5);
    assert_eq!(low[0]["visto"], false);

    let empty = active_alerts(&app, "EMPTY").await;
    assert_eq!(empty[0]["tipoAlerta"], "SIN_STOCK");
    assert!(active_alerts(&app, "OK").await.is_empty());
}

#[tokio::test]
async fn filters_by_kind_state_and_seen() {
    let app = build_test_app();
    seed_alerts(&app).await;

    let out = alerts(&app, "?tipo=SIN_STOCK").await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["codigoMaterial"], "EMPTY");

    let id = active_alerts(&app, "LOW").await[0]["idAlerta"]
        .as_i64()
        .unwrap();
    expect_json(
        put(app.clone(), &format!("/api/alertas/{id}/vista")).await,
        StatusCode::OK,
    )
    .await;

    let seen = alerts(&app, "?visto=true").await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["idAlerta"], id);
    assert_eq!(alerts(&app, "?visto=false").await.len(), 1);

    expect_json(
        put(app.clone(), &format!("/api/alertas/{id}/cerrar")).await,
        StatusCode::OK,
    )
    .await;
    let closed = alerts(&app, "?estado=CERRADA").await;
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0]["estadoAlerta"], "CERRADA");
    assert_eq!(alerts(&app, "?estado=ACTIVA").await.len(), 1);
}

#[tokio::test]
async fn unknown_alert_is_not_found() {
    let app = build_test_app();

    let response = put(app.clone(), "/api/alertas/999/vista").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = put(app, "/api/alertas/999/cerrar").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn closed_alert_reopens_on_next_low_stock_change() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "LOW", 3, 5).await;

    let id = active_alerts(&app, "LOW").await[0]["idAlerta"]
        .as_i64()
        .unwrap();
    put(app.clone(), &format!("/api/alertas/{id}/cerrar")).await;
    assert!(active_alerts(&app, "LOW").await.is_empty());

    let body = expect_json(
        post_json(
            app.clone(),
            "/api/entradas",
            json!({
                "OS": "OS-7",
                "fecha": today(),
                "proveedor": fx.supplier_id,
                "materiales": [{ "codigoMaterial": "LOW", "cantidad": 1 }]
            }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    let inbound = body["noEntrada"].as_i64().unwrap();
    put(app.clone(), &format!("/api/entradas/{inbound}/aprobar")).await;

    // 4 < 5: still low, so a fresh alert is opened.
    let reopened = active_alerts(&app, "LOW").await;
    assert_eq!(reopened.len(), 1);
    assert_ne!(reopened[0]["idAlerta"], id);
}

#[tokio::test]
async fn average_stock_over_active_materials() {
    let app = build_test_app();

    let body = expect_json(get(app.clone(), "/api/alertas/promedio").await, StatusCode::OK).await;
    assert_eq!(body["promedioGeneralStock"].as_f64(), Some(0.0));

    create_material(&app, "A", 2, 0).await;
    create_material(&app, "B", 7, 0).await;
    let body = expect_json(get(app, "/api/alertas/promedio").await, StatusCode::OK).await;
    assert_eq!(body["promedioGeneralStock"].as_f64(), Some(4.5));
}
