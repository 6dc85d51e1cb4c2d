//! Material rows and write DTOs.

use almacen_core::stock::StockLevel;
use almacen_core::types::{DbId, Quantity};
use serde::Serialize;
use sqlx::FromRow;

/// A material joined with its catalog names.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Material {
    #[serde(rename = "codigoMaterial")]
    pub code: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "unidadMedida")]
    pub unit: String,
    pub color: Option<String>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
    #[serde(rename = "stockActual")]
    pub stock_current: Quantity,
    #[serde(rename = "stockMinimo")]
    pub stock_minimum: Quantity,
    #[serde(rename = "stockReservado")]
    pub stock_reserved: Quantity,
    #[serde(rename = "imagen")]
    pub image_url: Option<String>,
    #[serde(rename = "codigoInterno")]
    pub internal_code: bool,
    #[serde(rename = "categoria")]
    pub category_id: Option<DbId>,
    #[serde(rename = "nombreCategoria")]
    pub category_name: Option<String>,
    #[serde(rename = "ubicacion")]
    pub location_id: Option<DbId>,
    #[serde(rename = "nombreUbicacion")]
    pub location_name: Option<String>,
    #[serde(rename = "marca")]
    pub brand_id: Option<DbId>,
    #[serde(rename = "nombreMarca")]
    pub brand_name: Option<String>,
    #[serde(rename = "proveedor")]
    pub supplier_id: Option<DbId>,
    #[serde(rename = "nombreProveedor")]
    pub supplier_name: Option<String>,
}

impl Material {
    pub fn stock(&self) -> StockLevel {
        StockLevel::new(self.stock_current, self.stock_minimum, self.stock_reserved)
    }
}

/// Catalog references shared by create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialRefs {
    pub category_id: Option<DbId>,
    pub location_id: Option<DbId>,
    pub brand_id: Option<DbId>,
    pub supplier_id: Option<DbId>,
}

/// DTO for registering a new material.
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub code: String,
    pub description: String,
    pub unit: String,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub stock_current: Quantity,
    pub stock_minimum: Quantity,
    pub image_url: Option<String>,
    pub internal_code: bool,
    pub refs: MaterialRefs,
}

/// DTO for a full update of a material's editable fields.
#[derive(Debug, Clone)]
pub struct MaterialChanges {
    pub description: String,
    pub unit: String,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub stock_current: Quantity,
    pub stock_minimum: Quantity,
    pub image_url: Option<String>,
    pub refs: MaterialRefs,
}

/// Inventory listing filters (`?descripcion=&categoria=`).
#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    pub description: Option<String>,
    pub category_id: Option<DbId>,
}
