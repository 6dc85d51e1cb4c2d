//! Integration tests for materials, lookup catalogs and clients.

mod common;

use std::sync::Arc;

use almacen_db::memory::MemoryStore;
use axum::http::StatusCode;
use common::{
    build_test_app, build_test_app_with, create_material, delete, expect_json, get, material,
    post_json, put_json, seed_parties, stock,
};
use serde_json::json;

#[tokio::test]
async fn material_is_created_with_catalog_names() {
    let store = Arc::new(MemoryStore::new());
    let category = store.seed_category("Tornilleria").unwrap();
    let location = store.seed_location("Pasillo A", Some("#ff0000")).unwrap();
    let app = build_test_app_with(store);
    seed_parties(&app).await;
    post_json(app.clone(), "/api/marcas", json!({ "nombre": "Truper" })).await;

    let response = post_json(
        app.clone(),
        "/api/materiales",
        json!({
            "codigoMaterial": "TOR-10",
            "descripcion": "Tornillo hexagonal 1/4",
            "unidadMedida": "PZA",
            "stockActual": 40,
            "stockMinimo": 10,
            "categoria": category,
            "ubicacion": location,
            "marca": 1,
            "proveedor": 1,
            "codigoInterno": true
        }),
    )
    .await;
    expect_json(response, StatusCode::CREATED).await;

    let m = material(&app, "TOR-10").await;
    assert_eq!(m["nombreCategoria"], "Tornilleria");
    assert_eq!(m["nombreUbicacion"], "Pasillo A");
    assert_eq!(m["nombreMarca"], "Truper");
    assert_eq!(m["nombreProveedor"], "Aceros del Norte");
    assert_eq!(m["codigoInterno"], true);
    assert_eq!(m["stockReservado"], 0);

    let filtered = expect_json(
        get(app.clone(), &format!("/api/materiales?categoria={category}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let by_text = expect_json(
        get(app.clone(), "/api/materiales?descripcion=HEXAGONAL").await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(by_text.as_array().unwrap().len(), 1);

    let categories = expect_json(get(app.clone(), "/api/categorias").await, StatusCode::OK).await;
    assert_eq!(categories[0]["categoria"], "Tornilleria");
    let locations = expect_json(get(app, "/api/ubicaciones").await, StatusCode::OK).await;
    assert_eq!(locations[0]["color"], "#ff0000");
}

#[tokio::test]
async fn material_create_failures() {
    let app = build_test_app();
    create_material(&app, "M-1", 1, 0).await;

    // Duplicate code.
    let response = post_json(
        app.clone(),
        "/api/materiales",
        json!({ "codigoMaterial": "M-1", "descripcion": "Otro", "unidadMedida": "PZA" }),
    )
    .await;
    let body = expect_json(response, StatusCode::CONFLICT).await;
    assert_eq!(body["code"], "CONFLICT");

    // Missing description.
    let response = post_json(
        app.clone(),
        "/api/materiales",
        json!({ "codigoMaterial": "M-2", "unidadMedida": "PZA" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown category.
    let response = post_json(
        app.clone(),
        "/api/materiales",
        json!({
            "codigoMaterial": "M-3",
            "descripcion": "Tuerca",
            "unidadMedida": "PZA",
            "categoria": 42
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Negative counters.
    let response = post_json(
        app,
        "/api/materiales",
        json!({
            "codigoMaterial": "M-4",
            "descripcion": "Arandela",
            "unidadMedida": "PZA",
            "stockActual": -1
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_cannot_drop_below_reserved_stock() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "M-1", 10, 0).await;

    let reservation = expect_json(
        post_json(
            app.clone(),
            "/api/material-apartado",
            json!({ "fecha": common::today(), "cliente": fx.client_id }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await["noApartado"]
        .as_i64()
        .unwrap();
    post_json(
        app.clone(),
        &format!("/api/material-apartado/{reservation}/materiales"),
        json!({ "codigoMaterial": "M-1", "cantidad": 6 }),
    )
    .await;

    let edit = |current: i32| {
        json!({
            "descripcion": "Material editado",
            "unidadMedida": "CAJA",
            "stockActual": current,
            "stockMinimo": 2
        })
    };

    let response = put_json(app.clone(), "/api/materiales/M-1", edit(5)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(stock(&app, "M-1").await, (10, 6));

    expect_json(
        put_json(app.clone(), "/api/materiales/M-1", edit(8)).await,
        StatusCode::OK,
    )
    .await;
    let m = material(&app, "M-1").await;
    assert_eq!(m["descripcion"], "Material editado");
    assert_eq!(m["unidadMedida"], "CAJA");
    assert_eq!(m["stockActual"], 8);
    assert_eq!(m["stockReservado"], 6);

    // Counters are required on update.
    let response = put_json(
        app.clone(),
        "/api/materiales/M-1",
        json!({ "descripcion": "Sin contadores", "unidadMedida": "PZA" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json(app, "/api/materiales/NOPE", edit(1)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_is_refused_while_reserved() {
    let app = build_test_app();
    let fx = seed_parties(&app).await;
    create_material(&app, "M-1", 10, 0).await;
    create_material(&app, "M-2", 1, 5).await;

    post_json(
        app.clone(),
        "/api/salidas",
        json!({
            "OS": "OS-1",
            "fecha": common::today(),
            "cliente": fx.client_id,
            "materiales": [{ "codigoMaterial": "M-1", "cantidad": 1 }]
        }),
    )
    .await;

    let response = delete(app.clone(), "/api/materiales/M-1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Deleting hides the material and closes its alert.
    assert_eq!(common::active_alerts(&app, "M-2").await.len(), 1);
    expect_json(delete(app.clone(), "/api/materiales/M-2").await, StatusCode::OK).await;
    let rows = expect_json(get(app.clone(), "/api/materiales").await, StatusCode::OK).await;
    assert!(rows.as_array().unwrap().iter().all(|m| m["codigoMaterial"] != "M-2"));
    assert!(common::active_alerts(&app, "M-2").await.is_empty());

    let response = delete(app, "/api/materiales/M-2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn brands_and_suppliers_are_unique() {
    let app = build_test_app();

    for uri in ["/api/marcas", "/api/proveedores"] {
        let response = post_json(app.clone(), uri, json!({ "nombre": "Truper" })).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = post_json(app.clone(), uri, json!({ "nombre": "Truper" })).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let response = post_json(app.clone(), uri, json!({ "nombre": "  " })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let rows = expect_json(get(app.clone(), uri).await, StatusCode::OK).await;
        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["nombre"], "Truper");
    }
}

#[tokio::test]
async fn client_crud() {
    let app = build_test_app();

    let created = expect_json(
        post_json(app.clone(), "/api/clientes", json!({ "nombreFiscal": "Obras del Bajio" })).await,
        StatusCode::CREATED,
    )
    .await;
    let id = created["claveCliente"].as_i64().unwrap();
    assert_eq!(created["nombreFiscal"], "Obras del Bajio");

    let fetched = expect_json(
        get(app.clone(), &format!("/api/clientes/{id}")).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(fetched["nombreFiscal"], "Obras del Bajio");

    let updated = expect_json(
        put_json(
            app.clone(),
            &format!("/api/clientes/{id}"),
            json!({ "nombreFiscal": "Obras del Bajio SA" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(updated["nombreFiscal"], "Obras del Bajio SA");

    post_json(app.clone(), "/api/clientes", json!({ "nombreFiscal": "Otro" })).await;
    let response = put_json(
        app.clone(),
        &format!("/api/clientes/{id}"),
        json!({ "nombreFiscal": "Otro" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get(app.clone(), "/api/clientes/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = post_json(app.clone(), "/api/clientes", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let all = expect_json(get(app, "/api/clientes").await, StatusCode::OK).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}
