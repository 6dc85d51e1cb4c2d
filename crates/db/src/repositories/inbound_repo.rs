//! Repository for `inbound_movements` and `inbound_lines`.

use almacen_core::error::CoreError;
use almacen_core::movement::{self, Direction, MovementLine, STATE_APPROVED, STATE_PENDING};
use almacen_core::types::{DbId, Quantity};
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::movement::{NewInbound, PendingInbound};
use crate::repositories::{CatalogRepo, StockRepo};
use crate::StoreResult;

const PENDING_COLUMNS: &str = "\
    e.id, e.work_order, e.movement_date AS date, s.name AS supplier_name, \
    e.supplier_id, e.client_id, c.legal_name AS client_name, e.state, \
    COUNT(l.material_code) AS total_materials";

pub struct InboundRepo;

impl InboundRepo {
    pub async fn insert_header(
        conn: &mut MySqlConnection,
        input: &NewInbound,
    ) -> Result<DbId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO inbound_movements \
                (work_order, movement_date, supplier_id, client_id, notes, state) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&input.work_order)
        .bind(input.date)
        .bind(input.supplier_id)
        .bind(input.client_id)
        .bind(&input.notes)
        .bind(STATE_PENDING)
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as DbId)
    }

    pub async fn insert_line(
        conn: &mut MySqlConnection,
        movement_id: DbId,
        line: &MovementLine,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO inbound_lines (movement_id, material_code, quantity) VALUES (?, ?, ?)",
        )
        .bind(movement_id)
        .bind(&line.material_code)
        .bind(line.quantity)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn lines(
        conn: &mut MySqlConnection,
        movement_id: DbId,
    ) -> Result<Vec<(String, Quantity)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT material_code, quantity FROM inbound_lines \
             WHERE movement_id = ? ORDER BY material_code",
        )
        .bind(movement_id)
        .fetch_all(&mut *conn)
        .await
    }

    /// Atomic `PEN -> APR`. Returns `true` if this call made the transition.
    pub async fn mark_approved(
        conn: &mut MySqlConnection,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE inbound_movements SET state = ?, approved_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND state = ?",
        )
        .bind(STATE_APPROVED)
        .bind(id)
        .bind(STATE_PENDING)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn state(conn: &mut MySqlConnection, id: DbId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT state FROM inbound_movements WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.map(|(state,)| state))
    }

    pub async fn list_pending(pool: &MySqlPool) -> Result<Vec<PendingInbound>, sqlx::Error> {
        let query = format!(
            "SELECT {PENDING_COLUMNS} FROM inbound_movements e \
             JOIN suppliers s ON s.id = e.supplier_id \
             LEFT JOIN clients c ON c.id = e.client_id \
             LEFT JOIN inbound_lines l ON l.movement_id = e.id \
             WHERE e.state = ? \
             GROUP BY e.id, e.work_order, e.movement_date, s.name, e.supplier_id, \
                      e.client_id, c.legal_name, e.state \
             ORDER BY e.movement_date DESC, e.id DESC"
        );
        sqlx::query_as::<_, PendingInbound>(&query)
            .bind(STATE_PENDING)
            .fetch_all(pool)
            .await
    }

    /// Header and lines in one transaction.
    pub async fn register(pool: &MySqlPool, input: &NewInbound) -> StoreResult<DbId> {
        let mut tx = pool.begin().await?;

        if !CatalogRepo::supplier_exists(&mut *tx, input.supplier_id).await? {
            return Err(CoreError::not_found("Proveedor", input.supplier_id).into());
        }
        if let Some(client_id) = input.client_id {
            if !CatalogRepo::client_exists(&mut *tx, client_id).await? {
                return Err(CoreError::not_found("Cliente", client_id).into());
            }
        }

        let id = Self::insert_header(&mut *tx, input).await?;
        for line in &input.lines {
            // Inbound stock lands on approval; here the material only has to exist.
            StockRepo::lock(&mut *tx, &line.material_code, true).await?;
            Self::insert_line(&mut *tx, id, line).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Approve and receive every line into stock.
    pub async fn approve(pool: &MySqlPool, id: DbId) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        if !Self::mark_approved(&mut *tx, id).await? {
            return match Self::state(&mut *tx, id).await? {
                None => Err(CoreError::not_found(Direction::Inbound.entity(), id).into()),
                Some(_) => Err(movement::not_pending().into()),
            };
        }

        let lines = Self::lines(&mut *tx, id).await?;
        for (code, quantity) in &lines {
            let quantity = *quantity;
            StockRepo::apply(&mut *tx, code, false, move |level| level.receive(quantity)).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
