//! Handlers for `/entradas` (inbound movements).

use almacen_core::movement::{validate_lines, LineDraft};
use almacen_core::types::{Date, DbId};
use almacen_db::models::movement::NewInbound;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::handlers::{non_blank, optional_text, required};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Request body for `POST /entradas`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInboundRequest {
    #[serde(rename = "OS")]
    #[validate(
        required(message = "OS is required"),
        length(max = 50),
        custom(function = "non_blank", message = "OS is required")
    )]
    pub work_order: Option<String>,
    #[serde(rename = "fecha")]
    #[validate(required(message = "fecha is required"))]
    pub date: Option<Date>,
    #[serde(rename = "proveedor")]
    #[validate(required(message = "proveedor is required"))]
    pub supplier_id: Option<DbId>,
    #[serde(rename = "cliente")]
    pub client_id: Option<DbId>,
    #[serde(rename = "materiales")]
    #[validate(required(message = "materiales must be a non-empty array"))]
    pub lines: Option<Vec<LineDraft>>,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InboundCreated {
    pub message: &'static str,
    #[serde(rename = "noEntrada")]
    pub id: DbId,
}

/// `?search=` for the material lookups on the movement forms.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// POST /api/entradas
///
/// Register an inbound movement with its lines. Stock is not touched until
/// the movement is approved.
pub async fn register_inbound(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInboundRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let lines = validate_lines(required(input.lines, "materiales")?)?;
    let movement = NewInbound {
        work_order: required(input.work_order, "OS")?.trim().to_string(),
        date: required(input.date, "fecha")?,
        supplier_id: required(input.supplier_id, "proveedor")?,
        client_id: input.client_id,
        notes: optional_text(input.notes),
        lines,
    };
    let line_count = movement.lines.len();

    let id = state.store.register_inbound(movement).await?;

    tracing::info!(movement_id = id, lines = line_count, "Inbound movement registered");

    Ok(Json(InboundCreated {
        message: "Entrada registrada correctamente",
        id,
    }))
}

/// GET /api/entradas/pendientes
pub async fn list_pending(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = state.store.pending_inbound().await?;
    Ok(Json(rows))
}

/// PUT /api/entradas/{id}/aprobar
///
/// `PEN -> APR`; adds every line's quantity to the material's current stock.
pub async fn approve_inbound(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    state.store.approve_inbound(id).await?;

    tracing::info!(movement_id = id, "Inbound movement approved");

    Ok(Json(MessageResponse::new("Entrada aprobada correctamente")))
}

/// GET /api/entradas/materiales/buscar?search=
pub async fn search_materials(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let term = params.search.unwrap_or_default();
    let materials = state.store.search_materials(term.trim()).await?;
    Ok(Json(materials))
}
