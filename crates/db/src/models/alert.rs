//! Low-stock alert rows.

use almacen_core::types::{DbId, Quantity, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// An alert joined with its material.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AlertDetail {
    #[serde(rename = "idAlerta")]
    pub id: DbId,
    #[serde(rename = "codigoMaterial")]
    pub material_code: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "stockActual")]
    pub stock_current: Quantity,
    #[serde(rename = "stockMinimo")]
    pub stock_minimum: Quantity,
    #[serde(rename = "tipoAlerta")]
    pub kind: String,
    #[serde(rename = "estadoAlerta")]
    pub state: String,
    #[serde(rename = "visto")]
    pub seen: bool,
    #[serde(rename = "fechaAlerta")]
    pub created_at: Timestamp,
}

/// `GET /alertas` filters; `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub kind: Option<String>,
    pub state: Option<String>,
    pub seen: Option<bool>,
}
