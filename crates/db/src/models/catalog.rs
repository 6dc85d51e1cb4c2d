//! Small lookup tables: categories, locations, brands, suppliers, clients.

use almacen_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Category {
    #[serde(rename = "codigo")]
    pub id: DbId,
    #[serde(rename = "categoria")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Location {
    #[serde(rename = "codigo")]
    pub id: DbId,
    #[serde(rename = "ubicacion")]
    pub name: String,
    pub color: Option<String>,
}

/// Brands and suppliers share the same `{codigo, nombre}` shape.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct NamedEntry {
    #[serde(rename = "codigo")]
    pub id: DbId,
    #[serde(rename = "nombre")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Client {
    #[serde(rename = "claveCliente")]
    pub id: DbId,
    #[serde(rename = "nombreFiscal")]
    pub legal_name: String,
}
