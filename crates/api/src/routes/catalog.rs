use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Catalog routes, merged at the `/api` root.
///
/// ```text
/// GET    /categorias      -> list_categories
/// GET    /ubicaciones     -> list_locations
/// GET    /marcas          -> list_brands
/// POST   /marcas          -> create_brand
/// GET    /proveedores     -> list_suppliers
/// POST   /proveedores     -> create_supplier
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categorias", get(catalog::list_categories))
        .route("/ubicaciones", get(catalog::list_locations))
        .route(
            "/marcas",
            get(catalog::list_brands).post(catalog::create_brand),
        )
        .route(
            "/proveedores",
            get(catalog::list_suppliers).post(catalog::create_supplier),
        )
}
