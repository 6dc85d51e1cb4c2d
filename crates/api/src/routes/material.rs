use axum::routing::{get, put};
use axum::Router;

use crate::handlers::material;
use crate::state::AppState;

/// Routes mounted at `/materiales`.
///
/// ```text
/// GET    /             -> list_materials
/// POST   /             -> create_material
/// PUT    /{code}       -> update_material
/// DELETE /{code}       -> delete_material
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(material::list_materials).post(material::create_material),
        )
        .route(
            "/{code}",
            put(material::update_material).delete(material::delete_material),
        )
}
