//! Handlers for `/clientes`.

use almacen_core::types::DbId;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParam};
use crate::handlers::{non_blank, required};
use crate::state::AppState;

/// Request body for `POST /clientes` and `PUT /clientes/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct ClientRequest {
    #[serde(rename = "nombreFiscal")]
    #[validate(
        required(message = "nombreFiscal is required"),
        length(max = 150),
        custom(function = "non_blank", message = "nombreFiscal is required")
    )]
    pub legal_name: Option<String>,
}

impl ClientRequest {
    fn into_name(self) -> AppResult<String> {
        self.validate()?;
        Ok(required(self.legal_name, "nombreFiscal")?.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ClientSaved {
    pub message: &'static str,
    #[serde(rename = "claveCliente")]
    pub id: DbId,
    #[serde(rename = "nombreFiscal")]
    pub legal_name: String,
}

/// GET /api/clientes
pub async fn list_clients(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.list_clients().await?))
}

/// GET /api/clientes/{id}
pub async fn get_client(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.get_client(id).await?))
}

/// POST /api/clientes
pub async fn create_client(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ClientRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input.into_name()?;
    let client = state.store.create_client(&name).await?;

    tracing::info!(client_id = client.id, "Client created");

    Ok((
        StatusCode::CREATED,
        Json(ClientSaved {
            message: "Cliente agregado correctamente",
            id: client.id,
            legal_name: client.legal_name,
        }),
    ))
}

/// PUT /api/clientes/{id}
pub async fn update_client(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
    JsonBody(input): JsonBody<ClientRequest>,
) -> AppResult<impl IntoResponse> {
    let name = input.into_name()?;
    let client = state.store.update_client(id, &name).await?;

    tracing::info!(client_id = id, "Client updated");

    Ok(Json(ClientSaved {
        message: "Cliente actualizado correctamente",
        id: client.id,
        legal_name: client.legal_name,
    }))
}
