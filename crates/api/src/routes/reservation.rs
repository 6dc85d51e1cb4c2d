use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::reservation;
use crate::state::AppState;

/// Routes mounted at `/material-apartado`.
///
/// ```text
/// GET    /                               -> list_reservations
/// POST   /                               -> create_reservation
/// GET    /{id}                           -> get_reservation
/// POST   /{id}/materiales                -> add_line
/// DELETE /{id}/materiales/{code}         -> remove_line
/// POST   /{id}/generar-salida            -> generate_outbound
/// GET    /{id}/salida-generada           -> generated_outbound
/// PUT    /{id}/estado                    -> update_state
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(reservation::list_reservations).post(reservation::create_reservation),
        )
        .route("/{id}", get(reservation::get_reservation))
        .route("/{id}/materiales", post(reservation::add_line))
        .route("/{id}/materiales/{code}", delete(reservation::remove_line))
        .route("/{id}/generar-salida", post(reservation::generate_outbound))
        .route("/{id}/salida-generada", get(reservation::generated_outbound))
        .route("/{id}/estado", put(reservation::update_state))
}
