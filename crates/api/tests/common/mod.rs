#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use almacen_api::auth::jwt::JwtConfig;
use almacen_api::config::{LogFormat, ServerConfig};
use almacen_api::router::build_app_router;
use almacen_api::state::AppState;
use almacen_db::memory::MemoryStore;
use almacen_db::store::Store;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Pretty,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            expiry_mins: 60,
        },
    }
}

/// Full application router over the given in-memory store, with the same
/// middleware stack as production.
pub fn build_test_app_with(store: Arc<MemoryStore>) -> Router {
    let config = test_config();
    let store: Arc<dyn Store> = store;
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Full application router over a fresh, empty in-memory store.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(MemoryStore::new()))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("router is infallible")
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, json_request(Method::POST, uri, &body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, json_request(Method::PUT, uri, &body)).await
}

/// PUT without a body (approvals, alert actions).
pub async fn put(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Send a raw string body, for malformed-JSON cases.
pub async fn post_raw(app: Router, uri: &str, body: &'static str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Assert the status and return the JSON body.
pub async fn expect_json(response: Response, status: StatusCode) -> Value {
    let actual = response.status();
    let body = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {body}");
    body
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Ids of the catalog rows every movement needs.
pub struct Fixture {
    pub supplier_id: i64,
    pub client_id: i64,
}

/// Create one supplier and one client through the API.
pub async fn seed_parties(app: &Router) -> Fixture {
    let response = post_json(
        app.clone(),
        "/api/proveedores",
        json!({ "nombre": "Aceros del Norte" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let suppliers = expect_json(get(app.clone(), "/api/proveedores").await, StatusCode::OK).await;
    let supplier_id = suppliers[0]["codigo"].as_i64().expect("supplier id");

    let client = expect_json(
        post_json(
            app.clone(),
            "/api/clientes",
            json!({ "nombreFiscal": "Constructora Ruiz SA de CV" }),
        )
        .await,
        StatusCode::CREATED,
    )
    .await;
    let client_id = client["claveCliente"].as_i64().expect("client id");

    Fixture {
        supplier_id,
        client_id,
    }
}

/// Create a material with the given counters.
pub async fn create_material(app: &Router, code: &str, current: i32, minimum: i32) {
    let response = post_json(
        app.clone(),
        "/api/materiales",
        json!({
            "codigoMaterial": code,
            "descripcion": format!("Material {code}"),
            "unidadMedida": "PZA",
            "stockActual": current,
            "stockMinimo": minimum,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Fetch one material from the inventory listing.
pub async fn material(app: &Router, code: &str) -> Value {
    let rows = expect_json(get(app.clone(), "/api/materiales").await, StatusCode::OK).await;
    rows.as_array()
        .expect("array")
        .iter()
        .find(|m| m["codigoMaterial"] == code)
        .cloned()
        .unwrap_or_else(|| panic!("material {code} not listed"))
}

/// `(stockActual, stockReservado)` of a material.
pub async fn stock(app: &Router, code: &str) -> (i64, i64) {
    let m = material(app, code).await;
    (
        m["stockActual"].as_i64().unwrap(),
        m["stockReservado"].as_i64().unwrap(),
    )
}

/// Active alerts of a material.
pub async fn active_alerts(app: &Router, code: &str) -> Vec<Value> {
    let body = expect_json(
        get(app.clone(), "/api/alertas?estado=ACTIVA").await,
        StatusCode::OK,
    )
    .await;
    body["alertas"]
        .as_array()
        .expect("alertas array")
        .iter()
        .filter(|a| a["codigoMaterial"] == code)
        .cloned()
        .collect()
}

pub fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
