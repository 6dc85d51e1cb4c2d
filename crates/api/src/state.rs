use std::sync::Arc;

use almacen_db::store::Store;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence. MySQL in production, in-memory in tests.
    pub store: Arc<dyn Store>,
    /// Server configuration (JWT settings are read by the auth handlers).
    pub config: Arc<ServerConfig>,
}
