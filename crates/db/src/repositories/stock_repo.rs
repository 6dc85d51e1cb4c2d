//! Row-locked stock mutations on `materials`.

use almacen_core::error::CoreError;
use almacen_core::stock::StockLevel;
use almacen_core::types::Quantity;
use sqlx::MySqlConnection;

use crate::repositories::AlertRepo;
use crate::StoreResult;

/// Reads and writes the three stock counters of a material.
pub struct StockRepo;

#[derive(sqlx::FromRow)]
struct StockRow {
    stock_current: Quantity,
    stock_minimum: Quantity,
    stock_reserved: Quantity,
    active: bool,
}

impl StockRepo {
    /// Lock a material row (`FOR UPDATE`) and return its counters.
    ///
    /// With `require_active`, deactivated materials are reported as missing.
    pub async fn lock(
        conn: &mut MySqlConnection,
        code: &str,
        require_active: bool,
    ) -> StoreResult<StockLevel> {
        let row = sqlx::query_as::<_, StockRow>(
            "SELECT stock_current, stock_minimum, stock_reserved, active \
             FROM materials WHERE code = ? FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) if row.active || !require_active => Ok(StockLevel::new(
                row.stock_current,
                row.stock_minimum,
                row.stock_reserved,
            )),
            _ => Err(CoreError::not_found("Material", code).into()),
        }
    }

    /// Persist new counters. The row must already be locked by the caller.
    pub async fn save(
        conn: &mut MySqlConnection,
        code: &str,
        level: &StockLevel,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE materials \
             SET stock_current = ?, stock_minimum = ?, stock_reserved = ? \
             WHERE code = ?",
        )
        .bind(level.current)
        .bind(level.minimum)
        .bind(level.reserved)
        .bind(code)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Lock, transform, save, then bring the material's alert in line.
    pub async fn apply<F>(
        conn: &mut MySqlConnection,
        code: &str,
        require_active: bool,
        change: F,
    ) -> StoreResult<StockLevel>
    where
        F: FnOnce(StockLevel) -> Result<StockLevel, CoreError> + Send,
    {
        let current = Self::lock(conn, code, require_active).await?;
        let next = change(current)?;
        Self::save(conn, code, &next).await?;
        AlertRepo::sync(conn, code, &next).await?;
        Ok(next)
    }
}
