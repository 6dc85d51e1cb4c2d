//! Repository for `outbound_movements` and `outbound_lines`.

use std::collections::BTreeMap;

use almacen_core::error::CoreError;
use almacen_core::movement::{self, Direction, MovementLine, STATE_APPROVED, STATE_PENDING};
use almacen_core::reservation;
use almacen_core::types::{Date, DbId, Quantity};
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::movement::{
    GeneratedOutbound, NewInbound, NewOutbound, PendingInbound, PendingOutbound,
};
use crate::repositories::{CatalogRepo, InboundRepo, MySqlStore, ReservationRepo, StockRepo};
use crate::store::MovementStore;
use crate::StoreResult;

const PENDING_COLUMNS: &str = "\
    s.id, s.work_order, s.movement_date AS date, s.quotation, \
    c.legal_name AS client_name, s.reservation_id, s.state, \
    COUNT(l.material_code) AS total_materials";

/// Header fields shared by manual registration and reservation conversion.
pub struct OutboundHeader<'a> {
    pub work_order: &'a str,
    pub date: Date,
    pub quotation: Option<&'a str>,
    pub client_id: DbId,
    pub reservation_id: Option<DbId>,
}

pub struct OutboundRepo;

impl OutboundRepo {
    pub async fn insert_header(
        conn: &mut MySqlConnection,
        header: &OutboundHeader<'_>,
    ) -> Result<DbId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO outbound_movements \
                (work_order, movement_date, quotation, client_id, reservation_id, state) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(header.work_order)
        .bind(header.date)
        .bind(header.quotation)
        .bind(header.client_id)
        .bind(header.reservation_id)
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
            "INSERT INTO outbound_lines (movement_id, material_code, quantity, notes) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(movement_id)
        .bind(&line.material_code)
        .bind(line.quantity)
        .bind(&line.notes)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn lines(
        conn: &mut MySqlConnection,
        movement_id: DbId,
    ) -> Result<Vec<(String, Quantity)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT material_code, quantity FROM outbound_lines \
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
            "UPDATE outbound_movements SET state = ?, approved_at = CURRENT_TIMESTAMP \
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
            sqlx::query_as("SELECT state FROM outbound_movements WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.map(|(state,)| state))
    }

    /// Whether some outbound movement already points at the reservation.
    pub async fn reservation_taken(
        conn: &mut MySqlConnection,
        reservation_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM outbound_movements WHERE reservation_id = ?")
                .bind(reservation_id)
                .fetch_optional(&mut *conn)
                .await?;
        Ok(row.is_some())
    }

    pub async fn list_pending(pool: &MySqlPool) -> Result<Vec<PendingOutbound>, sqlx::Error> {
        let query = format!(
            "SELECT {PENDING_COLUMNS} FROM outbound_movements s \
             LEFT JOIN clients c ON c.id = s.client_id \
             LEFT JOIN outbound_lines l ON l.movement_id = s.id \
             WHERE s.state = ? \
             GROUP BY s.id, s.work_order, s.movement_date, s.quotation, c.legal_name, \
                      s.reservation_id, s.state \
             ORDER BY s.movement_date DESC, s.id DESC"
        );
        sqlx::query_as::<_, PendingOutbound>(&query)
            .bind(STATE_PENDING)
            .fetch_all(pool)
            .await
    }

    pub async fn find_generated(
        pool: &MySqlPool,
        reservation_id: DbId,
    ) -> Result<Option<GeneratedOutbound>, sqlx::Error> {
        sqlx::query_as::<_, GeneratedOutbound>(
            "SELECT s.id, s.movement_date AS date, s.state, \
                    COUNT(l.material_code) AS total_materials \
             FROM outbound_movements s \
             LEFT JOIN outbound_lines l ON l.movement_id = s.id \
             WHERE s.reservation_id = ? \
             GROUP BY s.id, s.movement_date, s.state",
        )
        .bind(reservation_id)
        .fetch_optional(pool)
        .await
    }

    /// Header and lines in one transaction; each line holds its quantity.
    ///
    /// With a reservation, the movement takes over its holds: only the
    /// difference against each held quantity touches stock, and the
    /// reservation is marked converted.
    pub async fn register(pool: &MySqlPool, input: &NewOutbound) -> StoreResult<DbId> {
        let mut tx = pool.begin().await?;

        if !CatalogRepo::client_exists(&mut *tx, input.client_id).await? {
            return Err(CoreError::not_found("Cliente", input.client_id).into());
        }
        let mut held = BTreeMap::new();
        if let Some(reservation_id) = input.reservation_id {
            let header = ReservationRepo::lock(&mut *tx, reservation_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Apartado", reservation_id))?;
            let lines = ReservationRepo::held_lines(&mut *tx, reservation_id).await?;
            reservation::ensure_convertible(header.parsed_state(), header.converted, lines.len())?;
            if Self::reservation_taken(&mut *tx, reservation_id).await? {
                return Err(reservation::already_generated().into());
            }
            held = lines
                .into_iter()
                .map(|line| (line.material_code, line.quantity))
                .collect();
        }

        let header = OutboundHeader {
            work_order: &input.work_order,
            date: input.date,
            quotation: input.quotation.as_deref(),
            client_id: input.client_id,
            reservation_id: input.reservation_id,
        };
        let id = Self::insert_header(&mut *tx, &header).await?;

        // Material rows are locked in code order.
        for change in reservation::hold_changes(&held, &input.lines) {
            let (from, to) = (change.held, change.wanted);
            StockRepo::apply(&mut *tx, &change.material_code, from == 0, move |level| {
                level.rehold(from, to)
            })
            .await?;
        }
        for line in &input.lines {
            Self::insert_line(&mut *tx, id, line).await?;
        }
        if let Some(reservation_id) = input.reservation_id {
            ReservationRepo::mark_converted(&mut *tx, reservation_id).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Approve and ship every held line.
    pub async fn approve(pool: &MySqlPool, id: DbId) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        if !Self::mark_approved(&mut *tx, id).await? {
            return match Self::state(&mut *tx, id).await? {
                None => Err(CoreError::not_found(Direction::Outbound.entity(), id).into()),
                Some(_) => Err(movement::not_pending().into()),
            };
        }

        let lines = Self::lines(&mut *tx, id).await?;
        for (code, quantity) in &lines {
            let quantity = *quantity;
            StockRepo::apply(&mut *tx, code, false, move |level| {
                level.ship_reserved(quantity)
            })
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl MovementStore for MySqlStore {
    async fn register_inbound(&self, input: NewInbound) -> StoreResult<DbId> {
        InboundRepo::register(self.pool(), &input).await
    }

    async fn register_outbound(&self, input: NewOutbound) -> StoreResult<DbId> {
        OutboundRepo::register(self.pool(), &input).await
    }

    async fn pending_inbound(&self) -> StoreResult<Vec<PendingInbound>> {
        Ok(InboundRepo::list_pending(self.pool()).await?)
    }

    async fn pending_outbound(&self) -> StoreResult<Vec<PendingOutbound>> {
        Ok(OutboundRepo::list_pending(self.pool()).await?)
    }

    async fn approve_inbound(&self, id: DbId) -> StoreResult<()> {
        InboundRepo::approve(self.pool(), id).await
    }

    async fn approve_outbound(&self, id: DbId) -> StoreResult<()> {
        OutboundRepo::approve(self.pool(), id).await
    }
}
