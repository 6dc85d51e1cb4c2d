use axum::routing::get;
use axum::Router;

use crate::handlers::report;
use crate::state::AppState;

/// Reporting routes, merged at the `/api` root.
///
/// ```text
/// GET    /notificaciones            -> notifications
/// GET    /stats/stock-total         -> stock_total
/// GET    /stats/stock-disponible    -> stock_available
/// GET    /dashboard                 -> dashboard
/// GET    /historial                 -> history
/// GET    /historial/totales         -> history_totals
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notificaciones", get(report::notifications))
        .route("/stats/stock-total", get(report::stock_total))
        .route("/stats/stock-disponible", get(report::stock_available))
        .route("/dashboard", get(report::dashboard))
        .route("/historial", get(report::history))
        .route("/historial/totales", get(report::history_totals))
}
