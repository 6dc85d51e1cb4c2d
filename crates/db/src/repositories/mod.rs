//! MySQL implementation of the store traits.
//!
//! Each `*Repo` is a zero-sized namespace of SQL functions for one table
//! group. Single statements take `&MySqlPool`; anything that participates in a
//! multi-step write takes `&mut MySqlConnection` so the caller can run it
//! inside its transaction. The `impl *Store for MySqlStore` blocks sit next to
//! the repo they drive.

use crate::DbPool;

pub mod alert_repo;
pub mod catalog_repo;
pub mod inbound_repo;
pub mod material_repo;
pub mod outbound_repo;
pub mod report_repo;
pub mod reservation_repo;
pub mod stock_repo;
pub mod user_repo;

pub use alert_repo::AlertRepo;
pub use catalog_repo::CatalogRepo;
pub use inbound_repo::InboundRepo;
pub use material_repo::MaterialRepo;
pub use outbound_repo::OutboundRepo;
pub use report_repo::ReportRepo;
pub use reservation_repo::ReservationRepo;
pub use stock_repo::StockRepo;
pub use user_repo::UserRepo;

/// [`crate::store::Store`] backed by a MySQL pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: DbPool,
}

impl MySqlStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
