//! Inbound / outbound movement DTOs and list rows.

use almacen_core::movement::MovementLine;
use almacen_core::types::{Date, DbId};
use serde::Serialize;
use sqlx::FromRow;

/// DTO for registering an inbound movement ("entrada").
#[derive(Debug, Clone)]
pub struct NewInbound {
    pub work_order: String,
    pub date: Date,
    pub supplier_id: DbId,
    pub client_id: Option<DbId>,
    pub notes: Option<String>,
    pub lines: Vec<MovementLine>,
}

/// DTO for registering an outbound movement ("salida").
#[derive(Debug, Clone)]
pub struct NewOutbound {
    pub work_order: String,
    pub date: Date,
    pub quotation: Option<String>,
    pub client_id: DbId,
    pub reservation_id: Option<DbId>,
    pub lines: Vec<MovementLine>,
}

/// Row of `GET /entradas/pendientes`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PendingInbound {
    #[serde(rename = "noEntrada")]
    pub id: DbId,
    #[serde(rename = "OS")]
    pub work_order: String,
    #[serde(rename = "fecha")]
    pub date: Date,
    #[serde(rename = "nombre")]
    pub supplier_name: Option<String>,
    #[serde(rename = "proveedorId")]
    pub supplier_id: DbId,
    #[serde(rename = "clienteId")]
    pub client_id: Option<DbId>,
    #[serde(rename = "nombreFiscal")]
    pub client_name: Option<String>,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "totalMateriales")]
    pub total_materials: i64,
}

/// Row of `GET /salidas/pendientes`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PendingOutbound {
    #[serde(rename = "noSalida")]
    pub id: DbId,
    #[serde(rename = "OS")]
    pub work_order: String,
    #[serde(rename = "fecha")]
    pub date: Date,
    #[serde(rename = "cotizacion")]
    pub quotation: Option<String>,
    #[serde(rename = "cliente")]
    pub client_name: Option<String>,
    #[serde(rename = "materialApartado")]
    pub reservation_id: Option<DbId>,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "totalMateriales")]
    pub total_materials: i64,
}

/// Outbound movement generated from a reservation.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct GeneratedOutbound {
    #[serde(rename = "noSalida")]
    pub id: DbId,
    #[serde(rename = "fecha")]
    pub date: Date,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "totalMateriales")]
    pub total_materials: i64,
}
