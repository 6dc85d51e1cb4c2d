//! Repository for the `materials` table.

use almacen_core::error::CoreError;
use almacen_core::stock::StockLevel;
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::material::{Material, MaterialChanges, MaterialFilter, NewMaterial};
use crate::repositories::{AlertRepo, MySqlStore, StockRepo};
use crate::store::MaterialStore;
use crate::StoreResult;

const COLUMNS: &str = "\
    m.code, m.description, m.unit, m.color, m.notes, \
    m.stock_current, m.stock_minimum, m.stock_reserved, m.image_url, m.internal_code, \
    m.category_id, c.name AS category_name, m.location_id, l.name AS location_name, \
    m.brand_id, b.name AS brand_name, m.supplier_id, s.name AS supplier_name";

const JOINS: &str = "\
    materials m \
    LEFT JOIN categories c ON c.id = m.category_id \
    LEFT JOIN locations l ON l.id = m.location_id \
    LEFT JOIN brands b ON b.id = m.brand_id \
    LEFT JOIN suppliers s ON s.id = m.supplier_id";

pub struct MaterialRepo;

impl MaterialRepo {
    pub async fn find(pool: &MySqlPool, code: &str) -> Result<Option<Material>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {JOINS} WHERE m.code = ? AND m.active = TRUE");
        sqlx::query_as::<_, Material>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &MySqlPool,
        filter: &MaterialFilter,
    ) -> Result<Vec<Material>, sqlx::Error> {
        let pattern = filter.description.as_ref().map(|d| format!("%{d}%"));
        let query = format!(
            "SELECT {COLUMNS} FROM {JOINS} \
             WHERE m.active = TRUE \
               AND (? IS NULL OR m.description LIKE ?) \
               AND (? IS NULL OR m.category_id = ?) \
             ORDER BY m.description, m.code"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(pattern.as_deref())
            .bind(pattern.as_deref())
            .bind(filter.category_id)
            .bind(filter.category_id)
            .fetch_all(pool)
            .await
    }

    /// Code or description contains `term`.
    pub async fn search(pool: &MySqlPool, term: &str) -> Result<Vec<Material>, sqlx::Error> {
        let pattern = format!("%{term}%");
        let query = format!(
            "SELECT {COLUMNS} FROM {JOINS} \
             WHERE m.active = TRUE AND (m.code LIKE ? OR m.description LIKE ?) \
             ORDER BY m.description, m.code \
             LIMIT 50"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(pool)
            .await
    }

    /// Any row with this code, active or not.
    pub async fn code_taken(conn: &mut MySqlConnection, code: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT code FROM materials WHERE code = ? FOR UPDATE")
                .bind(code)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.is_some())
    }

    pub async fn insert(
        conn: &mut MySqlConnection,
        input: &NewMaterial,
        level: &StockLevel,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO materials \
                (code, description, unit, color, notes, stock_current, stock_minimum, \
                 stock_reserved, image_url, internal_code, category_id, location_id, \
                 brand_id, supplier_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.code)
        .bind(&input.description)
        .bind(&input.unit)
        .bind(&input.color)
        .bind(&input.notes)
        .bind(level.current)
        .bind(level.minimum)
        .bind(&input.image_url)
        .bind(input.internal_code)
        .bind(input.refs.category_id)
        .bind(input.refs.location_id)
        .bind(input.refs.brand_id)
        .bind(input.refs.supplier_id)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Write the descriptive fields. Counters are written by [`StockRepo`].
    pub async fn update_details(
        conn: &mut MySqlConnection,
        code: &str,
        changes: &MaterialChanges,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE materials SET \
                description = ?, unit = ?, color = ?, notes = ?, image_url = ?, \
                category_id = ?, location_id = ?, brand_id = ?, supplier_id = ? \
             WHERE code = ?",
        )
        .bind(&changes.description)
        .bind(&changes.unit)
        .bind(&changes.color)
        .bind(&changes.notes)
        .bind(&changes.image_url)
        .bind(changes.refs.category_id)
        .bind(changes.refs.location_id)
        .bind(changes.refs.brand_id)
        .bind(changes.refs.supplier_id)
        .bind(code)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn deactivate(conn: &mut MySqlConnection, code: &str) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE materials SET active = FALSE WHERE code = ?")
            .bind(code)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MaterialStore for MySqlStore {
    async fn list_materials(&self, filter: &MaterialFilter) -> StoreResult<Vec<Material>> {
        Ok(MaterialRepo::list(self.pool(), filter).await?)
    }

    async fn search_materials(&self, term: &str) -> StoreResult<Vec<Material>> {
        Ok(MaterialRepo::search(self.pool(), term).await?)
    }

    async fn create_material(&self, input: NewMaterial) -> StoreResult<Material> {
        let level = StockLevel::new(0, 0, 0)
            .with_minimum(input.stock_minimum)?
            .adjust_current(input.stock_current)?;

        let mut tx = self.pool().begin().await?;
        if MaterialRepo::code_taken(&mut *tx, &input.code).await? {
            return Err(CoreError::Conflict(format!(
                "Material {} already exists",
                input.code
            ))
            .into());
        }
        MaterialRepo::insert(&mut *tx, &input, &level).await?;
        AlertRepo::sync(&mut *tx, &input.code, &level).await?;
        tx.commit().await?;

        MaterialRepo::find(self.pool(), &input.code)
            .await?
            .ok_or_else(|| CoreError::not_found("Material", &input.code).into())
    }

    async fn update_material(
        &self,
        code: &str,
        changes: MaterialChanges,
    ) -> StoreResult<Material> {
        let mut tx = self.pool().begin().await?;
        let current = StockRepo::lock(&mut *tx, code, true).await?;
        let next = current
            .with_minimum(changes.stock_minimum)?
            .adjust_current(changes.stock_current)?;

        MaterialRepo::update_details(&mut *tx, code, &changes).await?;
        StockRepo::save(&mut *tx, code, &next).await?;
        AlertRepo::sync(&mut *tx, code, &next).await?;
        tx.commit().await?;

        MaterialRepo::find(self.pool(), code)
            .await?
            .ok_or_else(|| CoreError::not_found("Material", code).into())
    }

    async fn deactivate_material(&self, code: &str) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        let level = StockRepo::lock(&mut *tx, code, true).await?;
        if level.reserved > 0 {
            return Err(CoreError::InvalidState(format!(
                "Material {code} has {} reserved units",
                level.reserved
            ))
            .into());
        }
        MaterialRepo::deactivate(&mut *tx, code).await?;
        AlertRepo::close_for_material(&mut *tx, code).await?;
        tx.commit().await?;
        Ok(())
    }
}
