//! Reservation ("material apartado") rows and DTOs.

use almacen_core::reservation::ReservationState;
use almacen_core::types::{Date, DbId, Quantity};
use serde::Serialize;
use sqlx::FromRow;

/// DTO for creating a reservation header.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub work_order: Option<String>,
    pub date: Date,
    pub quotation: Option<String>,
    pub client_id: DbId,
    pub state: ReservationState,
}

/// DTO for adding a material to a reservation.
#[derive(Debug, Clone)]
pub struct NewReservationLine {
    pub material_code: String,
    pub quantity: Quantity,
    pub notes: Option<String>,
    pub alert: bool,
}

/// Row of `GET /material-apartado`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ReservationSummary {
    #[serde(rename = "noApartado")]
    pub id: DbId,
    #[serde(rename = "OS")]
    pub work_order: Option<String>,
    #[serde(rename = "fecha")]
    pub date: Date,
    #[serde(rename = "cotizacion")]
    pub quotation: Option<String>,
    #[serde(rename = "cliente")]
    pub client_id: DbId,
    #[serde(rename = "nombreCliente")]
    pub client_name: Option<String>,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "darSalida")]
    pub converted: bool,
    #[serde(rename = "totalMateriales")]
    pub total_materials: i64,
    #[serde(rename = "totalCantidad")]
    pub total_quantity: i64,
}

/// Reservation header as stored.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Reservation {
    #[serde(rename = "noApartado")]
    pub id: DbId,
    #[serde(rename = "OS")]
    pub work_order: Option<String>,
    #[serde(rename = "fecha")]
    pub date: Date,
    #[serde(rename = "cotizacion")]
    pub quotation: Option<String>,
    #[serde(rename = "cliente")]
    pub client_id: DbId,
    #[serde(rename = "nombreCliente")]
    pub client_name: Option<String>,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "darSalida")]
    pub converted: bool,
}

impl Reservation {
    /// Parsed state; unknown codes are treated as not active.
    pub fn parsed_state(&self) -> ReservationState {
        ReservationState::from_code(&self.state).unwrap_or(ReservationState::Cancelled)
    }
}

/// A reservation line joined with the material's counters.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ReservationLine {
    #[serde(rename = "codigoMaterial")]
    pub material_code: String,
    #[serde(rename = "cantidad")]
    pub quantity: Quantity,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(rename = "alerta")]
    pub alert: bool,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "unidadMedida")]
    pub unit: Option<String>,
    #[serde(rename = "stockActual")]
    pub stock_current: Option<Quantity>,
    #[serde(rename = "stockReservado")]
    pub stock_reserved: Option<Quantity>,
}

/// `GET /material-apartado/{id}`: header plus lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub header: Reservation,
    #[serde(rename = "materiales")]
    pub lines: Vec<ReservationLine>,
}
