pub mod alert;
pub mod auth;
pub mod catalog;
pub mod client;
pub mod health;
pub mod inbound;
pub mod material;
pub mod outbound;
pub mod report;
pub mod reservation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /entradas                                        register inbound (POST)
/// /entradas/pendientes                             pending inbound
/// /entradas/{id}/aprobar                           approve (PUT)
/// /entradas/materiales/buscar                      material search
///
/// /salidas                                         register outbound (POST)
/// /salidas/pendientes                              pending outbound
/// /salidas/{id}/aprobar                            approve (PUT)
/// /salidas/material/buscar                         material search
///
/// /material-apartado                               list, create
/// /material-apartado/{id}                          detail
/// /material-apartado/{id}/materiales               add line (POST)
/// /material-apartado/{id}/materiales/{code}        remove line (DELETE)
/// /material-apartado/{id}/generar-salida           convert (POST)
/// /material-apartado/{id}/salida-generada          generated outbound
/// /material-apartado/{id}/estado                   change state (PUT)
///
/// /alertas                                         list (filters)
/// /alertas/promedio                                average stock
/// /alertas/{id}/vista, /alertas/{id}/cerrar        mutate (PUT)
///
/// /materiales, /materiales/{code}                  inventory CRUD
/// /categorias, /ubicaciones                        catalogs (GET)
/// /marcas, /proveedores                            catalogs (GET, POST)
/// /clientes, /clientes/{id}                        clients
///
/// /auth/login, /auth/sesion                        session
/// /auth/usuarios, /auth/usuarios/{user}            users
/// /auth/tipos-acceso                               access levels
///
/// /notificaciones                                  badge counters
/// /stats/stock-total, /stats/stock-disponible      totals
/// /dashboard                                       dashboard aggregate
/// /historial, /historial/totales                   movement history
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/entradas", inbound::router())
        .nest("/salidas", outbound::router())
        .nest("/material-apartado", reservation::router())
        .nest("/alertas", alert::router())
        .nest("/materiales", material::router())
        .nest("/clientes", client::router())
        .nest("/auth", auth::router())
        .merge(catalog::router())
        .merge(report::router())
}
