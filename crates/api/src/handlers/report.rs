//! Read-only reporting endpoints: badges, totals, dashboard, history.

use almacen_core::error::CoreError;
use almacen_core::movement::Direction;
use almacen_core::types::Date;
use almacen_db::models::report::HistoryFilter;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extract::QueryParams;
use crate::handlers::optional_text;
use crate::state::AppState;

/// Query parameters for `GET /historial`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub codigo: Option<String>,
    pub descripcion: Option<String>,
    pub tipo: Option<String>,
    pub fecha_inicio: Option<Date>,
    pub fecha_fin: Option<Date>,
}

impl TryFrom<HistoryParams> for HistoryFilter {
    type Error = AppError;

    /// `codigo` and `descripcion` search the same text; the range applies only
    /// when both ends are present.
    fn try_from(params: HistoryParams) -> Result<Self, Self::Error> {
        let kind = match optional_text(params.tipo) {
            Some(code) => {
                let direction = Direction::from_code(&code.to_uppercase()).ok_or_else(|| {
                    AppError::Core(CoreError::Validation(format!(
                        "Invalid tipo '{code}'. Must be ENTRADA or SALIDA"
                    )))
                })?;
                Some(direction.code().to_string())
            }
            None => None,
        };

        let range = match (params.fecha_inicio, params.fecha_fin) {
            (Some(from), Some(to)) if from > to => {
                return Err(AppError::Core(CoreError::Validation(
                    "fechaInicio must not be after fechaFin".into(),
                )))
            }
            (Some(from), Some(to)) => Some((from, to)),
            _ => None,
        };

        Ok(HistoryFilter {
            search: optional_text(params.codigo).or_else(|| optional_text(params.descripcion)),
            kind,
            range,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StockTotal {
    #[serde(rename = "stockTotal")]
    pub stock_total: i64,
}

#[derive(Debug, Serialize)]
pub struct StockAvailable {
    #[serde(rename = "stockDisponible")]
    pub stock_available: i64,
}

/// GET /api/notificaciones
pub async fn notifications(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.notifications().await?))
}

/// GET /api/stats/stock-total
pub async fn stock_total(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let totals = state.store.stock_totals().await?;
    Ok(Json(StockTotal {
        stock_total: totals.stock_total,
    }))
}

/// GET /api/stats/stock-disponible
pub async fn stock_available(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let totals = state.store.stock_totals().await?;
    Ok(Json(StockAvailable {
        stock_available: totals.stock_available,
    }))
}

/// GET /api/dashboard
pub async fn dashboard(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let today = Utc::now().date_naive();
    Ok(Json(state.store.dashboard(today).await?))
}

/// GET /api/historial?codigo=&descripcion=&tipo=&fechaInicio=&fechaFin=
pub async fn history(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<HistoryParams>,
) -> AppResult<impl IntoResponse> {
    let filter = HistoryFilter::try_from(params)?;
    Ok(Json(state.store.history(&filter).await?))
}

/// GET /api/historial/totales
pub async fn history_totals(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.history_totals().await?))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;

    fn date(d: u32) -> Date {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn range_needs_both_ends() {
        let filter = HistoryFilter::try_from(HistoryParams {
            fecha_inicio: Some(date(1)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.range, None);

        let filter = HistoryFilter::try_from(HistoryParams {
            fecha_inicio: Some(date(1)),
            fecha_fin: Some(date(3)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.range, Some((date(1), date(3))));
    }

    #[test]
    fn inverted_range_rejected() {
        let result = HistoryFilter::try_from(HistoryParams {
            fecha_inicio: Some(date(9)),
            fecha_fin: Some(date(3)),
            ..Default::default()
        });
        assert_matches!(result, Err(AppError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn tipo_is_normalised_and_checked() {
        let filter = HistoryFilter::try_from(HistoryParams {
            tipo: Some("salida".into()),
            descripcion: Some("tornillo".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(filter.kind.as_deref(), Some("SALIDA"));
        assert_eq!(filter.search.as_deref(), Some("tornillo"));

        assert!(HistoryFilter::try_from(HistoryParams {
            tipo: Some("TRASPASO".into()),
            ..Default::default()
        })
        .is_err());
    }
}
