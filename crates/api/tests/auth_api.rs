//! Integration tests for `/auth`: users, login and session tokens.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{build_test_app, delete, expect_json, get, get_auth, post_json, put_json};
use serde_json::{json, Value};

fn new_user(user: &str, password: &str) -> Value {
    json!({
        "user": user,
        "passwordPlano": password,
        "nombre": "Ana",
        "apellidoPaterno": "Lopez",
        "apellidoMaterno": "Garcia",
        "acceso": "ALM"
    })
}

async fn create_user(app: &Router, user: &str, password: &str) -> Value {
    expect_json(
        post_json(app.clone(), "/api/auth/usuarios", new_user(user, password)).await,
        StatusCode::CREATED,
    )
    .await
}

async fn login(app: &Router, user: &str, password: &str) -> axum::response::Response {
    post_json(
        app.clone(),
        "/api/auth/login",
        json!({ "nombreUsuario": user, "password": password }),
    )
    .await
}

#[tokio::test]
async fn create_user_hides_the_hash() {
    let app = build_test_app();
    let body = create_user(&app, "alopez", "secreto1").await;
    assert_eq!(body["usuario"]["nombreUsuario"], "alopez");
    assert_eq!(body["usuario"]["acceso"], "ALM");
    assert!(body["usuario"].get("password_hash").is_none());

    let fetched = expect_json(get(app.clone(), "/api/auth/usuarios/alopez").await, StatusCode::OK).await;
    assert_eq!(fetched["apellidoMaterno"], "Garcia");

    let all = expect_json(get(app, "/api/auth/usuarios").await, StatusCode::OK).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_user_failures() {
    let app = build_test_app();
    create_user(&app, "alopez", "secreto1").await;

    let response = post_json(app.clone(), "/api/auth/usuarios", new_user("alopez", "otro123")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(app.clone(), "/api/auth/usuarios", new_user("corto", "abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut unknown_level = new_user("otro", "secreto1");
    unknown_level["acceso"] = json!("ROOT");
    let response = post_json(app.clone(), "/api/auth/usuarios", unknown_level).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app, "/api/auth/usuarios", json!({ "user": "x" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_issues_a_session_token() {
    let app = build_test_app();
    create_user(&app, "alopez", "secreto1").await;

    let body = expect_json(login(&app, "alopez", "secreto1").await, StatusCode::OK).await;
    assert_eq!(body["message"], "Login exitoso");
    assert_eq!(body["usuario"]["nombreCompleto"], "Ana Lopez Garcia");
    let token = body["token"].as_str().expect("token").to_string();

    let session = expect_json(
        get_auth(app.clone(), "/api/auth/sesion", &token).await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(session["nombreUsuario"], "alopez");
    assert_eq!(session["acceso"], "ALM");
    assert!(session["expira"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn login_failures() {
    let app = build_test_app();
    create_user(&app, "alopez", "secreto1").await;

    let wrong = expect_json(login(&app, "alopez", "incorrecta").await, StatusCode::UNAUTHORIZED).await;
    let unknown = expect_json(login(&app, "nadie", "secreto1").await, StatusCode::UNAUTHORIZED).await;
    // Same answer whether the user exists or not.
    assert_eq!(wrong["detalle"], unknown["detalle"]);
    assert_eq!(wrong["code"], "UNAUTHORIZED");

    let response = post_json(app.clone(), "/api/auth/login", json!({ "nombreUsuario": "alopez" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = login(&app, "", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_requires_a_valid_bearer_token() {
    let app = build_test_app();

    let response = get(app.clone(), "/api/auth/sesion").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/auth/sesion", "not-a-token").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_user_changes_password_and_profile() {
    let app = build_test_app();
    create_user(&app, "alopez", "secreto1").await;

    let response = put_json(app.clone(), "/api/auth/usuarios/alopez", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = expect_json(
        put_json(
            app.clone(),
            "/api/auth/usuarios/alopez",
            json!({ "nuevoPasswordPlano": "nuevo123", "acceso": "ADM" }),
        )
        .await,
        StatusCode::OK,
    )
    .await;
    assert_eq!(body["detalle"]["acceso"], "ADM");
    assert_eq!(body["detalle"]["nombre"], "Ana");

    assert_eq!(login(&app, "alopez", "secreto1").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(login(&app, "alopez", "nuevo123").await.status(), StatusCode::OK);

    let response = put_json(
        app.clone(),
        "/api/auth/usuarios/nadie",
        json!({ "nombre": "Luis" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json(
        app,
        "/api/auth/usuarios/alopez",
        json!({ "nuevoPasswordPlano": "123" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_user_then_not_found() {
    let app = build_test_app();
    create_user(&app, "alopez", "secreto1").await;

    let body = expect_json(delete(app.clone(), "/api/auth/usuarios/alopez").await, StatusCode::OK).await;
    assert_eq!(body["usuarioEliminado"], "alopez");

    let response = delete(app.clone(), "/api/auth/usuarios/alopez").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = get(app, "/api/auth/usuarios/alopez").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn access_levels_are_listed() {
    let app = build_test_app();
    let levels = expect_json(get(app, "/api/auth/tipos-acceso").await, StatusCode::OK).await;
    let codes: Vec<&str> = levels
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["codigoAcceso"].as_str().unwrap())
        .collect();
    assert_eq!(codes, ["ADM", "ALM", "CON"]);
}
