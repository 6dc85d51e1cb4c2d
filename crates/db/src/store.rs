//! The storage seam.
//!
//! Handlers only see `Arc<dyn Store>`. Production wires in
//! [`crate::repositories::MySqlStore`]; tests use [`crate::memory::MemoryStore`].
//! Both implementations enforce the same rules from `almacen-core`, so a
//! handler cannot tell them apart.

use almacen_core::reservation::ReservationState;
use almacen_core::types::{Date, DbId};
use async_trait::async_trait;

use crate::models::alert::{AlertDetail, AlertFilter};
use crate::models::catalog::{Category, Client, Location, NamedEntry};
use crate::models::material::{Material, MaterialChanges, MaterialFilter, NewMaterial};
use crate::models::movement::{
    GeneratedOutbound, NewInbound, NewOutbound, PendingInbound, PendingOutbound,
};
use crate::models::report::{
    Dashboard, HistoryEntry, HistoryFilter, HistoryTotal, Notifications, StockTotals,
};
use crate::models::reservation::{
    NewReservation, NewReservationLine, ReservationDetail, ReservationSummary,
};
use crate::models::user::{AccessLevel, NewUser, User, UserChanges, UserProfile};
use crate::StoreResult;

#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Active materials, filtered by description substring and category.
    async fn list_materials(&self, filter: &MaterialFilter) -> StoreResult<Vec<Material>>;

    /// Active materials whose code or description contains `term`.
    async fn search_materials(&self, term: &str) -> StoreResult<Vec<Material>>;

    async fn create_material(&self, input: NewMaterial) -> StoreResult<Material>;

    /// Replace the editable fields. Stock changes go through the stock rules.
    async fn update_material(&self, code: &str, changes: MaterialChanges)
        -> StoreResult<Material>;

    /// Soft delete. Refused while units are reserved.
    async fn deactivate_material(&self, code: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn list_locations(&self) -> StoreResult<Vec<Location>>;
    async fn list_brands(&self) -> StoreResult<Vec<NamedEntry>>;
    async fn create_brand(&self, name: &str) -> StoreResult<NamedEntry>;
    async fn list_suppliers(&self) -> StoreResult<Vec<NamedEntry>>;
    async fn create_supplier(&self, name: &str) -> StoreResult<NamedEntry>;
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;
    async fn get_client(&self, id: DbId) -> StoreResult<Client>;
    async fn create_client(&self, legal_name: &str) -> StoreResult<Client>;
    async fn update_client(&self, id: DbId, legal_name: &str) -> StoreResult<Client>;
}

#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Insert header and lines atomically; returns the new `noEntrada`.
    async fn register_inbound(&self, input: NewInbound) -> StoreResult<DbId>;

    /// Insert header and lines atomically, holding stock per line; returns
    /// the new `noSalida`.
    async fn register_outbound(&self, input: NewOutbound) -> StoreResult<DbId>;

    async fn pending_inbound(&self) -> StoreResult<Vec<PendingInbound>>;
    async fn pending_outbound(&self) -> StoreResult<Vec<PendingOutbound>>;

    /// `PEN -> APR` plus the stock effects, in one transaction.
    async fn approve_inbound(&self, id: DbId) -> StoreResult<()>;
    async fn approve_outbound(&self, id: DbId) -> StoreResult<()>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    async fn create_reservation(&self, input: NewReservation) -> StoreResult<DbId>;
    async fn list_reservations(&self) -> StoreResult<Vec<ReservationSummary>>;
    async fn get_reservation(&self, id: DbId) -> StoreResult<ReservationDetail>;
    async fn add_reservation_line(&self, id: DbId, line: NewReservationLine) -> StoreResult<()>;
    async fn remove_reservation_line(&self, id: DbId, material_code: &str) -> StoreResult<()>;

    /// Generate the outbound movement dated `date`; returns its `noSalida`.
    async fn convert_reservation(&self, id: DbId, date: Date) -> StoreResult<DbId>;

    async fn generated_outbound(&self, id: DbId) -> StoreResult<GeneratedOutbound>;
    async fn update_reservation_state(&self, id: DbId, next: ReservationState)
        -> StoreResult<()>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Newest first.
    async fn list_alerts(&self, filter: &AlertFilter) -> StoreResult<Vec<AlertDetail>>;
    async fn mark_alert_seen(&self, id: DbId) -> StoreResult<()>;
    async fn close_alert(&self, id: DbId) -> StoreResult<()>;

    /// Mean current stock over active materials (0 when there are none).
    async fn average_stock(&self) -> StoreResult<f64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, username: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<UserProfile>>;
    async fn create_user(&self, input: NewUser) -> StoreResult<UserProfile>;
    async fn update_user(&self, username: &str, changes: UserChanges) -> StoreResult<UserProfile>;
    async fn delete_user(&self, username: &str) -> StoreResult<()>;
    async fn list_access_levels(&self) -> StoreResult<Vec<AccessLevel>>;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Cheap reachability check for `/health`.
    async fn ping(&self) -> StoreResult<()>;

    async fn notifications(&self) -> StoreResult<Notifications>;
    async fn stock_totals(&self) -> StoreResult<StockTotals>;

    /// `today` decides which movements count as "today".
    async fn dashboard(&self, today: Date) -> StoreResult<Dashboard>;

    /// Newest first.
    async fn history(&self, filter: &HistoryFilter) -> StoreResult<Vec<HistoryEntry>>;
    async fn history_totals(&self) -> StoreResult<Vec<HistoryTotal>>;
}

/// Everything the HTTP layer needs from persistence.
pub trait Store:
    MaterialStore + CatalogStore + MovementStore + ReservationStore + AlertStore + UserStore + ReportStore
{
}

impl<T> Store for T where
    T: MaterialStore
        + CatalogStore
        + MovementStore
        + ReservationStore
        + AlertStore
        + UserStore
        + ReportStore
{
}
