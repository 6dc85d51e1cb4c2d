//! Read-only projections: counters, totals, dashboard, movement history.

use almacen_core::types::{Date, DbId, Quantity};
use serde::Serialize;
use sqlx::FromRow;

/// Badge counters shown in the UI header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notifications {
    #[serde(rename = "alertas")]
    pub active_alerts: i64,
    #[serde(rename = "entrada")]
    pub pending_inbound: i64,
    #[serde(rename = "salida")]
    pub pending_outbound: i64,
}

/// Stock sums over active materials.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct StockTotals {
    #[serde(rename = "totalMateriales")]
    pub material_count: i64,
    #[serde(rename = "stockTotal")]
    pub stock_total: i64,
    #[serde(rename = "stockDisponible")]
    pub stock_available: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertCounters {
    #[serde(rename = "activas")]
    pub active: i64,
    #[serde(rename = "sinVer")]
    pub unseen: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingApprovals {
    #[serde(rename = "entradas")]
    pub inbound: i64,
    #[serde(rename = "salidas")]
    pub outbound: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementsToday {
    #[serde(rename = "entradasHoy")]
    pub inbound: i64,
    #[serde(rename = "salidasHoy")]
    pub outbound: i64,
    #[serde(rename = "totalHoy")]
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CategoryStock {
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "stockTotal")]
    pub stock_total: i64,
}

/// `GET /dashboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    #[serde(rename = "totalesMateriales")]
    pub totals: StockTotals,
    #[serde(rename = "alertas")]
    pub alerts: AlertCounters,
    #[serde(rename = "aprobacionesPendientes")]
    pub pending: PendingApprovals,
    #[serde(rename = "movimientosHoy")]
    pub today: MovementsToday,
    #[serde(rename = "stockPorCategoria")]
    pub stock_by_category: Vec<CategoryStock>,
}

/// One material line of an inbound or outbound movement.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct HistoryEntry {
    #[serde(rename = "tipoMovimiento")]
    pub kind: String,
    #[serde(rename = "noMovimiento")]
    pub movement_id: DbId,
    #[serde(rename = "OS")]
    pub work_order: Option<String>,
    #[serde(rename = "fecha")]
    pub date: Date,
    #[serde(rename = "codigoMaterial")]
    pub material_code: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "cantidad")]
    pub quantity: Quantity,
    #[serde(rename = "estado")]
    pub state: String,
}

/// `GET /historial` filters.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Substring matched against material code or description.
    pub search: Option<String>,
    /// `ENTRADA` or `SALIDA`.
    pub kind: Option<String>,
    /// Inclusive date range; only applied when both ends are present.
    pub range: Option<(Date, Date)>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct HistoryTotal {
    #[serde(rename = "tipoMovimiento")]
    pub kind: String,
    #[serde(rename = "totalMovimientos")]
    pub movements: i64,
    #[serde(rename = "totalCantidad")]
    pub quantity: i64,
}
