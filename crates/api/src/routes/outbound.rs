use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{inbound, outbound};
use crate::state::AppState;

/// Routes mounted at `/salidas`.
///
/// ```text
/// POST   /                       -> register_outbound
/// GET    /pendientes             -> list_pending
/// GET    /historial              -> outbound_history
/// PUT    /{id}/aprobar           -> approve_outbound
/// GET    /material/buscar        -> search_materials (shared with /entradas)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(outbound::register_outbound))
        .route("/pendientes", get(outbound::list_pending))
        .route("/historial", get(outbound::outbound_history))
        .route("/{id}/aprobar", put(outbound::approve_outbound))
        .route("/material/buscar", get(inbound::search_materials))
}
