//! Handlers for `/salidas` (outbound movements).

use almacen_core::movement::{validate_lines, Direction, LineDraft};
use almacen_core::types::{Date, DbId};
use almacen_db::models::movement::NewOutbound;
use almacen_db::models::report::HistoryFilter;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParam, QueryParams};
use crate::handlers::report::HistoryParams;
use crate::handlers::{non_blank, optional_text, required};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Request body for `POST /salidas`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterOutboundRequest {
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
    #[serde(rename = "cotizacion")]
    #[validate(length(max = 50))]
    pub quotation: Option<String>,
    #[serde(rename = "cliente")]
    #[validate(required(message = "cliente is required"))]
    pub client_id: Option<DbId>,
    #[serde(rename = "materialApartado")]
    pub reservation_id: Option<DbId>,
    #[serde(rename = "materiales")]
    #[validate(required(message = "materiales must be a non-empty array"))]
    pub lines: Option<Vec<LineDraft>>,
}

#[derive(Debug, Serialize)]
pub struct OutboundCreated {
    pub message: &'static str,
    #[serde(rename = "noSalida")]
    pub id: DbId,
}

/// POST /api/salidas
///
/// Register an outbound movement. Each line holds its quantity against the
/// material's available stock until approval. With `materialApartado` the
/// movement takes over that reservation's holds and marks it converted.
pub async fn register_outbound(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterOutboundRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let lines = validate_lines(required(input.lines, "materiales")?)?;
    let movement = NewOutbound {
        work_order: required(input.work_order, "OS")?.trim().to_string(),
        date: required(input.date, "fecha")?,
        quotation: optional_text(input.quotation),
        client_id: required(input.client_id, "cliente")?,
        reservation_id: input.reservation_id,
        lines,
    };
    let line_count = movement.lines.len();
    let movement_reservation = movement.reservation_id;

    let id = state.store.register_outbound(movement).await?;

    tracing::info!(
        movement_id = id,
        lines = line_count,
        reservation_id = ?movement_reservation,
        "Outbound movement registered"
    );

    Ok(Json(OutboundCreated {
        message: "Salida registrada correctamente",
        id,
    }))
}

/// GET /api/salidas/pendientes
pub async fn list_pending(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = state.store.pending_outbound().await?;
    Ok(Json(rows))
}

/// PUT /api/salidas/{id}/aprobar
///
/// `PEN -> APR`; ships the held quantities out of current stock.
pub async fn approve_outbound(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    state.store.approve_outbound(id).await?;

    tracing::info!(movement_id = id, "Outbound movement approved");

    Ok(Json(MessageResponse::new("Salida aprobada correctamente")))
}

/// GET /api/salidas/historial?codigo=&descripcion=&fechaInicio=&fechaFin=
///
/// The movement history restricted to outbound lines; `tipo` is ignored.
pub async fn outbound_history(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let mut filter = HistoryFilter::try_from(HistoryParams { tipo: None, ..params })?;
    filter.kind = Some(Direction::Outbound.code().to_string());
    Ok(Json(state.store.history(&filter).await?))
}
