//! Repository for `reservations` and `reservation_lines`.

use almacen_core::error::CoreError;
use almacen_core::movement::MovementLine;
use almacen_core::reservation::{self, ReservationState};
use almacen_core::types::{Date, DbId, Quantity};
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::movement::GeneratedOutbound;
use crate::models::reservation::{
    NewReservation, NewReservationLine, Reservation, ReservationDetail, ReservationLine,
    ReservationSummary,
};
use crate::repositories::outbound_repo::OutboundHeader;
use crate::repositories::{CatalogRepo, MySqlStore, OutboundRepo, StockRepo};
use crate::store::ReservationStore;
use crate::StoreResult;

const HEADER_COLUMNS: &str = "\
    r.id, r.work_order, r.reserved_on AS date, r.quotation, r.client_id, \
    c.legal_name AS client_name, r.state, r.converted";

const LINE_COLUMNS: &str = "\
    l.material_code, l.quantity, l.notes, l.alert, m.description, m.unit, \
    m.stock_current, m.stock_reserved";

/// A reservation header locked for update.
#[derive(Debug, sqlx::FromRow)]
pub struct LockedReservation {
    pub work_order: Option<String>,
    pub quotation: Option<String>,
    pub client_id: DbId,
    pub state: String,
    pub converted: bool,
}

impl LockedReservation {
    /// Unknown codes count as not active.
    pub fn parsed_state(&self) -> ReservationState {
        ReservationState::from_code(&self.state).unwrap_or(ReservationState::Cancelled)
    }
}

/// A reservation line as stored, without the material details.
#[derive(Debug, sqlx::FromRow)]
pub struct HeldLine {
    pub material_code: String,
    pub quantity: Quantity,
    pub notes: Option<String>,
}

pub struct ReservationRepo;

impl ReservationRepo {
    pub async fn lock(
        conn: &mut MySqlConnection,
        id: DbId,
    ) -> Result<Option<LockedReservation>, sqlx::Error> {
        sqlx::query_as::<_, LockedReservation>(
            "SELECT work_order, quotation, client_id, state, converted \
             FROM reservations WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
    }

    async fn lock_existing(conn: &mut MySqlConnection, id: DbId) -> StoreResult<LockedReservation> {
        Self::lock(conn, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Apartado", id).into())
    }

    pub async fn held_lines(conn: &mut MySqlConnection, id: DbId) -> Result<Vec<HeldLine>, sqlx::Error> {
        sqlx::query_as::<_, HeldLine>(
            "SELECT material_code, quantity, notes FROM reservation_lines \
             WHERE reservation_id = ? ORDER BY material_code",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await
    }

    pub async fn insert(
        conn: &mut MySqlConnection,
        input: &NewReservation,
    ) -> Result<DbId, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO reservations (work_order, reserved_on, quotation, client_id, state) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&input.work_order)
        .bind(input.date)
        .bind(&input.quotation)
        .bind(input.client_id)
        .bind(input.state.code())
        .execute(&mut *conn)
        .await?;
        Ok(result.last_insert_id() as DbId)
    }

    pub async fn list(pool: &MySqlPool) -> Result<Vec<ReservationSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {HEADER_COLUMNS}, \
                    COUNT(l.material_code) AS total_materials, \
                    CAST(COALESCE(SUM(l.quantity), 0) AS SIGNED) AS total_quantity \
             FROM reservations r \
             LEFT JOIN clients c ON c.id = r.client_id \
             LEFT JOIN reservation_lines l ON l.reservation_id = r.id \
             GROUP BY r.id, r.work_order, r.reserved_on, r.quotation, r.client_id, \
                      c.legal_name, r.state, r.converted \
             ORDER BY r.reserved_on DESC, r.id DESC"
        );
        sqlx::query_as::<_, ReservationSummary>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &MySqlPool, id: DbId) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {HEADER_COLUMNS} FROM reservations r \
             LEFT JOIN clients c ON c.id = r.client_id \
             WHERE r.id = ?"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_lines(
        pool: &MySqlPool,
        id: DbId,
    ) -> Result<Vec<ReservationLine>, sqlx::Error> {
        let query = format!(
            "SELECT {LINE_COLUMNS} FROM reservation_lines l \
             LEFT JOIN materials m ON m.code = l.material_code \
             WHERE l.reservation_id = ? \
             ORDER BY l.material_code"
        );
        sqlx::query_as::<_, ReservationLine>(&query)
            .bind(id)
            .fetch_all(pool)
            .await
    }

    /// Insert a line, or add to the quantity of an existing one.
    pub async fn upsert_line(
        conn: &mut MySqlConnection,
        id: DbId,
        line: &NewReservationLine,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO reservation_lines (reservation_id, material_code, quantity, notes, alert) \
             VALUES (?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE \
                quantity = quantity + VALUES(quantity), \
                notes = COALESCE(VALUES(notes), notes), \
                alert = VALUES(alert)",
        )
        .bind(id)
        .bind(&line.material_code)
        .bind(line.quantity)
        .bind(&line.notes)
        .bind(line.alert)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn line_quantity(
        conn: &mut MySqlConnection,
        id: DbId,
        code: &str,
    ) -> Result<Option<Quantity>, sqlx::Error> {
        let row: Option<(Quantity,)> = sqlx::query_as(
            "SELECT quantity FROM reservation_lines \
             WHERE reservation_id = ? AND material_code = ? FOR UPDATE",
        )
        .bind(id)
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row.map(|(q,)| q))
    }

    pub async fn delete_line(
        conn: &mut MySqlConnection,
        id: DbId,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM reservation_lines WHERE reservation_id = ? AND material_code = ?")
            .bind(id)
            .bind(code)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn set_state(
        conn: &mut MySqlConnection,
        id: DbId,
        state: ReservationState,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reservations SET state = ? WHERE id = ?")
            .bind(state.code())
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn mark_converted(conn: &mut MySqlConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE reservations SET converted = TRUE WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for MySqlStore {
    async fn create_reservation(&self, input: NewReservation) -> StoreResult<DbId> {
        let mut tx = self.pool().begin().await?;
        if !CatalogRepo::client_exists(&mut *tx, input.client_id).await? {
            return Err(CoreError::not_found("Cliente", input.client_id).into());
        }
        // The id comes from this insert's own result on this connection.
        let id = ReservationRepo::insert(&mut *tx, &input).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn list_reservations(&self) -> StoreResult<Vec<ReservationSummary>> {
        Ok(ReservationRepo::list(self.pool()).await?)
    }

    async fn get_reservation(&self, id: DbId) -> StoreResult<ReservationDetail> {
        let header = ReservationRepo::find(self.pool(), id)
            .await?
            .ok_or_else(|| CoreError::not_found("Apartado", id))?;
        let lines = ReservationRepo::list_lines(self.pool(), id).await?;
        Ok(ReservationDetail { header, lines })
    }

    async fn add_reservation_line(&self, id: DbId, line: NewReservationLine) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        let header = ReservationRepo::lock_existing(&mut *tx, id).await?;
        reservation::ensure_lines_mutable(header.parsed_state(), header.converted)?;
        reservation::ensure_quantity(line.quantity)?;

        let quantity = line.quantity;
        StockRepo::apply(&mut *tx, &line.material_code, true, move |level| {
            level.reserve(quantity)
        })
        .await?;
        ReservationRepo::upsert_line(&mut *tx, id, &line).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_reservation_line(&self, id: DbId, material_code: &str) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        let header = ReservationRepo::lock_existing(&mut *tx, id).await?;
        reservation::ensure_lines_mutable(header.parsed_state(), header.converted)?;

        let quantity = ReservationRepo::line_quantity(&mut *tx, id, material_code)
            .await?
            .ok_or_else(|| CoreError::not_found("Material apartado", material_code))?;

        StockRepo::apply(&mut *tx, material_code, false, move |level| {
            level.release(quantity)
        })
        .await?;
        ReservationRepo::delete_line(&mut *tx, id, material_code).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn convert_reservation(&self, id: DbId, date: Date) -> StoreResult<DbId> {
        let mut tx = self.pool().begin().await?;
        let header = ReservationRepo::lock_existing(&mut *tx, id).await?;
        let held = ReservationRepo::held_lines(&mut *tx, id).await?;
        reservation::ensure_convertible(header.parsed_state(), header.converted, held.len())?;

        // The holds move to the outbound movement as they are; only check them.
        for line in &held {
            StockRepo::lock(&mut *tx, &line.material_code, false)
                .await?
                .ensure_reserved(line.quantity)?;
        }

        if OutboundRepo::reservation_taken(&mut *tx, id).await? {
            return Err(reservation::already_generated().into());
        }

        let outbound = OutboundHeader {
            work_order: header.work_order.as_deref().unwrap_or_default(),
            date,
            quotation: header.quotation.as_deref(),
            client_id: header.client_id,
            reservation_id: Some(id),
        };
        let outbound_id = OutboundRepo::insert_header(&mut *tx, &outbound).await?;
        for line in held {
            let line = MovementLine {
                material_code: line.material_code,
                quantity: line.quantity,
                notes: line.notes,
            };
            OutboundRepo::insert_line(&mut *tx, outbound_id, &line).await?;
        }
        ReservationRepo::mark_converted(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(outbound_id)
    }

    async fn generated_outbound(&self, id: DbId) -> StoreResult<GeneratedOutbound> {
        OutboundRepo::find_generated(self.pool(), id)
            .await?
            .ok_or_else(|| CoreError::not_found("Salida generada para apartado", id).into())
    }

    async fn update_reservation_state(
        &self,
        id: DbId,
        next: ReservationState,
    ) -> StoreResult<()> {
        let mut tx = self.pool().begin().await?;
        let header = ReservationRepo::lock_existing(&mut *tx, id).await?;
        let change = reservation::transition(header.parsed_state(), next, header.converted)?;

        if change.release_holds {
            for line in ReservationRepo::held_lines(&mut *tx, id).await? {
                let quantity = line.quantity;
                StockRepo::apply(&mut *tx, &line.material_code, false, move |level| {
                    level.release(quantity)
                })
                .await?;
            }
        }
        ReservationRepo::set_state(&mut *tx, id, change.next).await?;

        tx.commit().await?;
        Ok(())
    }
}
