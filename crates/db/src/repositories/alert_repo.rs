//! Repository for the `alerts` table.

use almacen_core::alert::{self, AlertAction, AlertKind, STATE_ACTIVE, STATE_CLOSED};
use almacen_core::error::CoreError;
use almacen_core::stock::StockLevel;
use almacen_core::types::DbId;
use async_trait::async_trait;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::alert::{AlertDetail, AlertFilter};
use crate::repositories::MySqlStore;
use crate::store::AlertStore;
use crate::StoreResult;

const DETAIL_COLUMNS: &str = "\
    a.id, a.material_code, m.description, m.stock_current, m.stock_minimum, \
    a.kind, a.state, a.seen, a.created_at";

pub struct AlertRepo;

impl AlertRepo {
    /// Open, retype or close the material's active alert to match `level`.
    pub async fn sync(
        conn: &mut MySqlConnection,
        code: &str,
        level: &StockLevel,
    ) -> Result<(), sqlx::Error> {
        let active: Option<(DbId, String)> = sqlx::query_as(
            "SELECT id, kind FROM alerts \
             WHERE material_code = ? AND state = ? \
             ORDER BY id DESC LIMIT 1 FOR UPDATE",
        )
        .bind(code)
        .bind(STATE_ACTIVE)
        .fetch_optional(&mut *conn)
        .await?;

        let active_kind = active.as_ref().and_then(|(_, kind)| AlertKind::from_code(kind));

        match alert::sync(level, active_kind) {
            AlertAction::Keep => {}
            AlertAction::Open(kind) => {
                sqlx::query("INSERT INTO alerts (material_code, kind, state) VALUES (?, ?, ?)")
                    .bind(code)
                    .bind(kind.code())
                    .bind(STATE_ACTIVE)
                    .execute(&mut *conn)
                    .await?;
                tracing::info!(material = %code, kind = kind.code(), "Low-stock alert opened");
            }
            AlertAction::Retype(kind) => {
                if let Some((id, _)) = active {
                    sqlx::query("UPDATE alerts SET kind = ?, seen = FALSE WHERE id = ?")
                        .bind(kind.code())
                        .bind(id)
                        .execute(&mut *conn)
                        .await?;
                }
            }
            AlertAction::Close => {
                Self::close_for_material(conn, code).await?;
                tracing::info!(material = %code, "Low-stock alert closed");
            }
        }
        Ok(())
    }

    /// Close every active alert of a material.
    pub async fn close_for_material(
        conn: &mut MySqlConnection,
        code: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE alerts SET state = ?, closed_at = CURRENT_TIMESTAMP \
             WHERE material_code = ? AND state = ?",
        )
        .bind(STATE_CLOSED)
        .bind(code)
        .bind(STATE_ACTIVE)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn list(
        pool: &MySqlPool,
        filter: &AlertFilter,
    ) -> Result<Vec<AlertDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM alerts a \
             JOIN materials m ON m.code = a.material_code \
             WHERE (? IS NULL OR a.kind = ?) \
               AND (? IS NULL OR a.state = ?) \
               AND (? IS NULL OR a.seen = ?) \
             ORDER BY a.created_at DESC, a.id DESC"
        );
        sqlx::query_as::<_, AlertDetail>(&query)
            .bind(filter.kind.as_deref())
            .bind(filter.kind.as_deref())
            .bind(filter.state.as_deref())
            .bind(filter.state.as_deref())
            .bind(filter.seen)
            .bind(filter.seen)
            .fetch_all(pool)
            .await
    }

    pub async fn exists(pool: &MySqlPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    /// Returns `true` if a row changed.
    pub async fn mark_seen(pool: &MySqlPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE alerts SET seen = TRUE WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a row changed.
    pub async fn close(pool: &MySqlPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE alerts SET state = ?, closed_at = COALESCE(closed_at, CURRENT_TIMESTAMP) \
             WHERE id = ?",
        )
        .bind(STATE_CLOSED)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mean current stock of active materials.
    pub async fn average_stock(pool: &MySqlPool) -> Result<f64, sqlx::Error> {
        let (avg,): (f64,) = sqlx::query_as(
            "SELECT CAST(COALESCE(AVG(stock_current), 0) AS DOUBLE) \
             FROM materials WHERE active = TRUE",
        )
        .fetch_one(pool)
        .await?;
        Ok(avg)
    }
}

#[async_trait]
impl AlertStore for MySqlStore {
    async fn list_alerts(&self, filter: &AlertFilter) -> StoreResult<Vec<AlertDetail>> {
        Ok(AlertRepo::list(self.pool(), filter).await?)
    }

    async fn mark_alert_seen(&self, id: DbId) -> StoreResult<()> {
        // MySQL reports zero affected rows when the value is unchanged.
        let changed = AlertRepo::mark_seen(self.pool(), id).await?;
        if !changed && !AlertRepo::exists(self.pool(), id).await? {
            return Err(CoreError::not_found("Alerta", id).into());
        }
        Ok(())
    }

    async fn close_alert(&self, id: DbId) -> StoreResult<()> {
        let changed = AlertRepo::close(self.pool(), id).await?;
        if !changed && !AlertRepo::exists(self.pool(), id).await? {
            return Err(CoreError::not_found("Alerta", id).into());
        }
        Ok(())
    }

    async fn average_stock(&self) -> StoreResult<f64> {
        Ok(AlertRepo::average_stock(self.pool()).await?)
    }
}
