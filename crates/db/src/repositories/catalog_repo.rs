//! Repository for the lookup tables: categories, locations, brands,
//! suppliers and clients.

use almacen_core::error::CoreError;
use almacen_core::types::DbId;
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::catalog::{Category, Client, Location, NamedEntry};
use crate::repositories::MySqlStore;
use crate::store::CatalogStore;
use crate::StoreResult;

pub struct CatalogRepo;

impl CatalogRepo {
    pub async fn list_categories(pool: &MySqlPool) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn list_locations(pool: &MySqlPool) -> Result<Vec<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>("SELECT id, name, color FROM locations ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn list_brands(pool: &MySqlPool) -> Result<Vec<NamedEntry>, sqlx::Error> {
        sqlx::query_as::<_, NamedEntry>("SELECT id, name FROM brands ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn insert_brand(pool: &MySqlPool, name: &str) -> Result<NamedEntry, sqlx::Error> {
        let result = sqlx::query("INSERT INTO brands (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(NamedEntry {
            id: result.last_insert_id() as DbId,
            name: name.to_string(),
        })
    }

    pub async fn list_suppliers(pool: &MySqlPool) -> Result<Vec<NamedEntry>, sqlx::Error> {
        sqlx::query_as::<_, NamedEntry>("SELECT id, name FROM suppliers ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn insert_supplier(pool: &MySqlPool, name: &str) -> Result<NamedEntry, sqlx::Error> {
        let result = sqlx::query("INSERT INTO suppliers (name) VALUES (?)")
            .bind(name)
            .execute(pool)
            .await?;
        Ok(NamedEntry {
            id: result.last_insert_id() as DbId,
            name: name.to_string(),
        })
    }

    pub async fn supplier_exists(conn: &mut MySqlConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM suppliers WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn list_clients(pool: &MySqlPool) -> Result<Vec<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>("SELECT id, legal_name FROM clients ORDER BY legal_name")
            .fetch_all(pool)
            .await
    }

    pub async fn find_client(pool: &MySqlPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>("SELECT id, legal_name FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn client_exists(conn: &mut MySqlConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    pub async fn insert_client(pool: &MySqlPool, legal_name: &str) -> Result<Client, sqlx::Error> {
        let result = sqlx::query("INSERT INTO clients (legal_name) VALUES (?)")
            .bind(legal_name)
            .execute(pool)
            .await?;
        Ok(Client {
            id: result.last_insert_id() as DbId,
            legal_name: legal_name.to_string(),
        })
    }

    pub async fn rename_client(
        pool: &MySqlPool,
        id: DbId,
        legal_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE clients SET legal_name = ? WHERE id = ?")
            .bind(legal_name)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MySqlStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        Ok(CatalogRepo::list_categories(self.pool()).await?)
    }

    async fn list_locations(&self) -> StoreResult<Vec<Location>> {
        Ok(CatalogRepo::list_locations(self.pool()).await?)
    }

    async fn list_brands(&self) -> StoreResult<Vec<NamedEntry>> {
        Ok(CatalogRepo::list_brands(self.pool()).await?)
    }

    async fn create_brand(&self, name: &str) -> StoreResult<NamedEntry> {
        Ok(CatalogRepo::insert_brand(self.pool(), name).await?)
    }

    async fn list_suppliers(&self) -> StoreResult<Vec<NamedEntry>> {
        Ok(CatalogRepo::list_suppliers(self.pool()).await?)
    }

    async fn create_supplier(&self, name: &str) -> StoreResult<NamedEntry> {
        Ok(CatalogRepo::insert_supplier(self.pool(), name).await?)
    }

    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(CatalogRepo::list_clients(self.pool()).await?)
    }

    async fn get_client(&self, id: DbId) -> StoreResult<Client> {
        CatalogRepo::find_client(self.pool(), id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cliente", id).into())
    }

    async fn create_client(&self, legal_name: &str) -> StoreResult<Client> {
        Ok(CatalogRepo::insert_client(self.pool(), legal_name).await?)
    }

    async fn update_client(&self, id: DbId, legal_name: &str) -> StoreResult<Client> {
        if CatalogRepo::find_client(self.pool(), id).await?.is_none() {
            return Err(CoreError::not_found("Cliente", id).into());
        }
        CatalogRepo::rename_client(self.pool(), id, legal_name).await?;
        Ok(Client {
            id,
            legal_name: legal_name.to_string(),
        })
    }
}
