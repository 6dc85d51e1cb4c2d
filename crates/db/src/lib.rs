//! Persistence layer for the warehouse backend.
//!
//! Exposes the MySQL pool helpers, the row models, the [`store::Store`] trait
//! family the HTTP layer depends on, and two implementations of it:
//! [`repositories::MySqlStore`] and [`memory::MemoryStore`].

use std::time::Duration;

use almacen_core::error::CoreError;
use sqlx::mysql::MySqlPoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::MySqlPool;

/// Errors raised by a store: a business rule refused the operation, or the
/// database failed underneath it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Create a bounded connection pool from a database URL.
///
/// Callers beyond `max_connections` wait up to `acquire_timeout` for a free
/// connection before the acquire fails.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
