use axum::routing::{get, put};
use axum::Router;

use crate::handlers::alert;
use crate::state::AppState;

/// Routes mounted at `/alertas`.
///
/// ```text
/// GET    /                  -> list_alerts
/// GET    /promedio          -> average_stock
/// PUT    /{id}/vista        -> mark_seen
/// PUT    /{id}/cerrar       -> close_alert
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alert::list_alerts))
        .route("/promedio", get(alert::average_stock))
        .route("/{id}/vista", put(alert::mark_seen))
        .route("/{id}/cerrar", put(alert::close_alert))
}
