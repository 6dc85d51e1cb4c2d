use axum::routing::get;
use axum::Router;

use crate::handlers::client;
use crate::state::AppState;

/// Routes mounted at `/clientes`.
///
/// ```text
/// GET    /         -> list_clients
/// POST   /         -> create_client
/// GET    /{id}     -> get_client
/// PUT    /{id}     -> update_client
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(client::list_clients).post(client::create_client))
        .route("/{id}", get(client::get_client).put(client::update_client))
}
