//! Handlers for `/auth/login` and `/auth/sesion`.

use almacen_core::error::CoreError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_token;
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::extract::JsonBody;
use crate::handlers::required;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(rename = "nombreUsuario")]
    #[validate(
        required(message = "nombreUsuario and password are required"),
        length(min = 1, message = "nombreUsuario and password are required")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "nombreUsuario and password are required"),
        length(min = 1, message = "nombreUsuario and password are required")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub usuario: SessionUser,
    pub token: String,
}

/// User info returned at login.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    #[serde(rename = "nombreUsuario")]
    pub username: String,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: String,
    #[serde(rename = "apellidoMaterno")]
    pub maternal_surname: String,
    #[serde(rename = "acceso")]
    pub access_code: String,
    #[serde(rename = "nombreCompleto")]
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(rename = "nombreUsuario")]
    pub username: String,
    #[serde(rename = "acceso")]
    pub access_code: String,
    /// Expiration as a Unix timestamp.
    #[serde(rename = "expira")]
    pub expires_at: i64,
}

fn invalid_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Usuario o contrasena incorrectos".into(),
    ))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Verify the Argon2id password hash and issue a session token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let username = required(input.username, "nombreUsuario")?;
    let password = required(input.password, "password")?;

    let user = state
        .store
        .find_user(&username)
        .await?
        .ok_or_else(invalid_credentials)?;

    let verified = verify_password(&password, &user.password_hash).unwrap_or_else(|e| {
        tracing::warn!(user = %user.username, error = %e, "Stored password hash is unreadable");
        false
    });
    if !verified {
        tracing::info!(user = %username, "Login rejected");
        return Err(invalid_credentials());
    }

    let token = generate_token(&user.username, &user.access_code, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user = %user.username, acceso = %user.access_code, "User logged in");

    let full_name = format!(
        "{} {} {}",
        user.first_name, user.paternal_surname, user.maternal_surname
    );
    Ok(Json(LoginResponse {
        message: "Login exitoso",
        usuario: SessionUser {
            username: user.username,
            first_name: user.first_name,
            paternal_surname: user.paternal_surname,
            maternal_surname: user.maternal_surname,
            access_code: user.access_code,
            full_name,
        },
        token,
    }))
}

/// GET /api/auth/sesion
///
/// Decode the `Bearer` token issued at login.
pub async fn session(auth: AuthUser) -> AppResult<impl IntoResponse> {
    Ok(Json(SessionResponse {
        username: auth.claims.sub,
        access_code: auth.claims.acceso,
        expires_at: auth.claims.exp,
    }))
}
