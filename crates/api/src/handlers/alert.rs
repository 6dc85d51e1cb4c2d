//! Handlers for `/alertas`.

use almacen_core::types::DbId;
use almacen_db::models::alert::{AlertDetail, AlertFilter};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::{PathParam, QueryParams};
use crate::handlers::optional_text;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Query parameters for `GET /alertas`.
#[derive(Debug, Deserialize)]
pub struct AlertParams {
    pub tipo: Option<String>,
    pub estado: Option<String>,
    /// `"true"` selects seen alerts; any other value selects unseen ones.
    pub visto: Option<String>,
}

impl From<AlertParams> for AlertFilter {
    fn from(params: AlertParams) -> Self {
        AlertFilter {
            kind: optional_text(params.tipo),
            state: optional_text(params.estado),
            seen: params.visto.map(|v| v == "true"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AlertList {
    pub alertas: Vec<AlertDetail>,
}

#[derive(Debug, Serialize)]
pub struct AverageStock {
    #[serde(rename = "promedioGeneralStock")]
    pub average: f64,
}

/// GET /api/alertas?tipo=&estado=&visto=
pub async fn list_alerts(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<AlertParams>,
) -> AppResult<impl IntoResponse> {
    let alertas = state.store.list_alerts(&params.into()).await?;
    Ok(Json(AlertList { alertas }))
}

/// GET /api/alertas/promedio
pub async fn average_stock(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let average = state.store.average_stock().await?;
    Ok(Json(AverageStock { average }))
}

/// PUT /api/alertas/{id}/vista
pub async fn mark_seen(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    state.store.mark_alert_seen(id).await?;
    tracing::info!(alert_id = id, "Alert marked as seen");
    Ok(Json(MessageResponse::new(
        "Alerta marcada como vista correctamente",
    )))
}

/// PUT /api/alertas/{id}/cerrar
pub async fn close_alert(
    State(state): State<AppState>,
    PathParam(id): PathParam<DbId>,
) -> AppResult<impl IntoResponse> {
    state.store.close_alert(id).await?;
    tracing::info!(alert_id = id, "Alert closed");
    Ok(Json(MessageResponse::new("Alerta cerrada correctamente")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visto_only_true_means_seen() {
        let filter: AlertFilter = AlertParams {
            tipo: Some("STOCK_BAJO".into()),
            estado: Some(" ".into()),
            visto: Some("1".into()),
        }
        .into();
        assert_eq!(filter.kind.as_deref(), Some("STOCK_BAJO"));
        assert_eq!(filter.state, None);
        assert_eq!(filter.seen, Some(false));

        let filter: AlertFilter = AlertParams {
            tipo: None,
            estado: None,
            visto: Some("true".into()),
        }
        .into();
        assert_eq!(filter.seen, Some(true));
    }
}
