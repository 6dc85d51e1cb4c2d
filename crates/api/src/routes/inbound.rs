use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::inbound;
use crate::state::AppState;

/// Routes mounted at `/entradas`.
///
/// ```text
/// POST   /                       -> register_inbound
/// GET    /pendientes             -> list_pending
/// PUT    /{id}/aprobar           -> approve_inbound
/// GET    /materiales/buscar      -> search_materials
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(inbound::register_inbound))
        .route("/pendientes", get(inbound::list_pending))
        .route("/{id}/aprobar", put(inbound::approve_inbound))
        .route("/materiales/buscar", get(inbound::search_materials))
}
