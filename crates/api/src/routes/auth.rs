use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, user};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /login                 -> login
/// GET    /sesion                -> session
/// GET    /usuarios              -> list_users
/// POST   /usuarios              -> create_user
/// GET    /usuarios/{user}       -> get_user
/// PUT    /usuarios/{user}       -> update_user
/// DELETE /usuarios/{user}       -> delete_user
/// GET    /tipos-acceso          -> list_access_levels
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/sesion", get(auth::session))
        .route("/usuarios", get(user::list_users).post(user::create_user))
        .route(
            "/usuarios/{user}",
            get(user::get_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/tipos-acceso", get(user::list_access_levels))
}
