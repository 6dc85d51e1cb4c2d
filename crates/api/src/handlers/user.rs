//! Handlers for `/auth/usuarios` and `/auth/tipos-acceso`.

use almacen_core::error::CoreError;
use almacen_db::models::user::{NewUser, UserChanges, UserProfile};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, PathParam};
use crate::handlers::{non_blank, optional_text, required};
use crate::state::AppState;

/// Request body for `POST /auth/usuarios`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "user is required"),
        length(max = 50),
        custom(function = "non_blank", message = "user is required")
    )]
    pub user: Option<String>,
    #[serde(rename = "passwordPlano")]
    #[validate(required(message = "passwordPlano is required"))]
    pub password: Option<String>,
    #[serde(rename = "nombre")]
    #[validate(
        required(message = "nombre is required"),
        custom(function = "non_blank", message = "nombre is required")
    )]
    pub first_name: Option<String>,
    #[serde(rename = "apellidoPaterno")]
    #[validate(
        required(message = "apellidoPaterno is required"),
        custom(function = "non_blank", message = "apellidoPaterno is required")
    )]
    pub paternal_surname: Option<String>,
    #[serde(rename = "apellidoMaterno")]
    #[validate(
        required(message = "apellidoMaterno is required"),
        custom(function = "non_blank", message = "apellidoMaterno is required")
    )]
    pub maternal_surname: Option<String>,
    #[serde(rename = "acceso")]
    #[validate(
        required(message = "acceso is required"),
        custom(function = "non_blank", message = "acceso is required")
    )]
    pub access_code: Option<String>,
}

/// Request body for `PUT /auth/usuarios/{user}`. Omitted fields are kept.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(rename = "nuevoPasswordPlano")]
    pub new_password: Option<String>,
    #[serde(rename = "nombre")]
    pub first_name: Option<String>,
    #[serde(rename = "apellidoPaterno")]
    pub paternal_surname: Option<String>,
    #[serde(rename = "apellidoMaterno")]
    pub maternal_surname: Option<String>,
    #[serde(rename = "acceso")]
    pub access_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserSaved {
    pub message: &'static str,
    pub usuario: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserUpdated {
    pub message: &'static str,
    pub detalle: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct UserDeleted {
    pub message: &'static str,
    #[serde(rename = "usuarioEliminado")]
    pub username: String,
}

fn hash_new_password(password: &str) -> AppResult<String> {
    validate_password_strength(password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    hash_password(password).map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// GET /api/auth/usuarios
pub async fn list_users(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_users().await?))
}

/// GET /api/auth/usuarios/{user}
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(username): PathParam<String>,
) -> AppResult<impl IntoResponse> {
    let user = state
        .store
        .find_user(&username)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Usuario", &username)))?;
    Ok(Json(UserProfile::from(&user)))
}

/// POST /api/auth/usuarios
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let password_hash = hash_new_password(&required(input.password, "passwordPlano")?)?;
    let user = NewUser {
        username: required(input.user, "user")?.trim().to_string(),
        password_hash,
        first_name: required(input.first_name, "nombre")?.trim().to_string(),
        paternal_surname: required(input.paternal_surname, "apellidoPaterno")?
            .trim()
            .to_string(),
        maternal_surname: required(input.maternal_surname, "apellidoMaterno")?
            .trim()
            .to_string(),
        access_code: required(input.access_code, "acceso")?.trim().to_string(),
    };

    let profile = state.store.create_user(user).await?;

    tracing::info!(user = %profile.username, acceso = %profile.access_code, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserSaved {
            message: "Usuario creado exitosamente",
            usuario: profile,
        }),
    ))
}

/// PUT /api/auth/usuarios/{user}
///
/// At least one field must be present.
pub async fn update_user(
    State(state): State<AppState>,
    PathParam(username): PathParam<String>,
    JsonBody(input): JsonBody<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let password_hash = match input.new_password.filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_new_password(&password)?),
        None => None,
    };
    let changes = UserChanges {
        password_hash,
        first_name: optional_text(input.first_name),
        paternal_surname: optional_text(input.paternal_surname),
        maternal_surname: optional_text(input.maternal_surname),
        access_code: optional_text(input.access_code),
    };

    if changes.password_hash.is_none()
        && changes.first_name.is_none()
        && changes.paternal_surname.is_none()
        && changes.maternal_surname.is_none()
        && changes.access_code.is_none()
    {
        return Err(AppError::BadRequest(
            "At least one field must be provided".into(),
        ));
    }

    let profile = state.store.update_user(&username, changes).await?;

    tracing::info!(user = %username, "User updated");

    Ok(Json(UserUpdated {
        message: "Usuario actualizado exitosamente",
        detalle: profile,
    }))
}

/// DELETE /api/auth/usuarios/{user}
pub async fn delete_user(
    State(state): State<AppState>,
    PathParam(username): PathParam<String>,
) -> AppResult<impl IntoResponse> {
    state.store.delete_user(&username).await?;

    tracing::info!(user = %username, "User deleted");

    Ok(Json(UserDeleted {
        message: "Usuario eliminado exitosamente",
        username,
    }))
}

/// GET /api/auth/tipos-acceso
pub async fn list_access_levels(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_access_levels().await?))
}
