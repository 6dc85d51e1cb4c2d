//! Handlers for `/material-apartado` (reservations).
//!
//! A reservation holds stock for a client. Lines can be added and removed while
//! it is active; `generar-salida` turns it, once, into a pending outbound
//! movement that inherits the holds.

use almacen_core::reservation::{self, ReservationState};
use almacen_core::types::{Date, DbId, Quantity};
use almacen_db::models::reservation::{NewReservation, NewReservationLine};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParam};
use crate::handlers::{non_blank, optional_text, required};
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /material-apartado`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationRequest {
    #[serde(rename = "OS")]
    #[validate(length(max = 50))]
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
    /// Defaults to `ACT`.
    #[serde(rename = "estado")]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReservationCreated {
    pub message: &'static str,
    #[serde(rename = "noApartado")]
    pub id: DbId,
}

/// Request body for `POST /material-apartado/{id}/materiales`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddLineRequest {
    #[serde(rename = "codigoMaterial")]
    #[validate(
        required(message = "codigoMaterial is required"),
        custom(function = "non_blank", message = "codigoMaterial is required")
    )]
    pub material_code: Option<String>,
    #[serde(rename = "cantidad")]
    #[validate(required(message = "cantidad is required"))]
    pub quantity: Option<Quantity>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(rename = "alerta", default)]
    pub alert: bool,
}

/// Request body for `PUT /material-apartado/{id}/estado`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStateRequest {
    #[serde(rename = "estado")]
    #[validate(required(message = "estado is required"))]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutboundGenerated {
    pub message: &'static str,
    #[serde(rename = "noSalida")]
    pub id: DbId,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/material-apartado
pub async fn create_reservation(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateReservationRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let reservation_state = reservation::initial_state(optional_text(input.state).as_deref())?;

    let reservation = NewReservation {
        work_order: optional_text(input.work_order),
        date: required(input.date, "fecha")?,
        quotation: optional_text(input.quotation),
        client_id: required(input.client_id, "cliente")?,
        state: reservation_state,
    };

    let id = state.store.create_reservation(reservation).await?;

    tracing::info!(reservation_id = id, "Reservation created");

    Ok((
        StatusCode::CREATED,
        Json(ReservationCreated {
            message: "Apartado creado correctamente",
            id,
        }),
    ))
}

/// GET /api/material-apartado
pub async fn list_reservations(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let rows = state.store.list_reservations().await?;
    Ok(Json(rows))
}

/// GET /api/material-apartado/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    let detail = state.store.get_reservation(id).await?;
    Ok(Json(detail))
}

/// POST /api/material-apartado/{id}/materiales
///
/// Hold `cantidad` units of a material. Adding a material that is already on
/// the reservation increases its quantity.
pub async fn add_line(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
    JsonBody(input): JsonBody<AddLineRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let line = NewReservationLine {
        material_code: required(input.material_code, "codigoMaterial")?
            .trim()
            .to_string(),
        quantity: required(input.quantity, "cantidad")?,
        notes: optional_text(input.notes),
        alert: input.alert,
    };
    let material = line.material_code.clone();
    let quantity = line.quantity;

    state.store.add_reservation_line(id, line).await?;

    tracing::info!(reservation_id = id, %material, quantity, "Material reserved");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Material agregado al apartado")),
    ))
}

/// DELETE /api/material-apartado/{id}/materiales/{code}
pub async fn remove_line(
    State(state): State<AppState>,
    PathParam((id, code)): PathParam<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    state.store.remove_reservation_line(id, &code).await?;

    tracing::info!(reservation_id = id, material = %code, "Reserved material removed");

    Ok(Json(MessageResponse::new("Material eliminado del apartado")))
}

/// POST /api/material-apartado/{id}/generar-salida
///
/// Create the pending outbound movement for this reservation, dated today.
/// A second call fails with 400 and creates nothing.
pub async fn generate_outbound(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    let today = Utc::now().date_naive();
    let outbound_id = state.store.convert_reservation(id, today).await?;

    tracing::info!(reservation_id = id, movement_id = outbound_id, "Reservation converted to outbound movement");

    Ok(Json(OutboundGenerated {
        message: "Salida generada correctamente",
        id: outbound_id,
    }))
}

/// GET /api/material-apartado/{id}/salida-generada
pub async fn generated_outbound(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    let outbound = state.store.generated_outbound(id).await?;
    Ok(Json(outbound))
}

/// PUT /api/material-apartado/{id}/estado
///
/// `ACT -> CAN` releases the holds; `ACT -> FIN` requires the conversion.
pub async fn update_state(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
    JsonBody(input): JsonBody<UpdateStateRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let next = ReservationState::parse(required(input.state, "estado")?.trim())?;
    state.store.update_reservation_state(id, next).await?;

    tracing::info!(reservation_id = id, estado = next.code(), "Reservation state changed");

    Ok(Json(MessageResponse::new("Estado del apartado actualizado")))
}
