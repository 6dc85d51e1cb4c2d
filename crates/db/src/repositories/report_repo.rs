//! Read-only aggregates: header counters, stock totals, dashboard and the
//! movement history.

use almacen_core::alert::STATE_ACTIVE;
use almacen_core::movement::STATE_PENDING;
use almacen_core::types::Date;
use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::models::report::{
    AlertCounters, CategoryStock, Dashboard, HistoryEntry, HistoryFilter, HistoryTotal,
    MovementsToday, Notifications, PendingApprovals, StockTotals,
};
use crate::repositories::MySqlStore;
use crate::store::ReportStore;
use crate::StoreResult;

/// Every inbound and outbound line, one row each.
const HISTORY_SOURCE: &str = "\
    SELECT 'ENTRADA' AS kind, e.id AS movement_id, e.work_order, e.movement_date AS date, \
           l.material_code, m.description, l.quantity, e.state \
    FROM inbound_lines l \
    JOIN inbound_movements e ON e.id = l.movement_id \
    JOIN materials m ON m.code = l.material_code \
    UNION ALL \
    SELECT 'SALIDA' AS kind, s.id AS movement_id, s.work_order, s.movement_date AS date, \
           l.material_code, m.description, l.quantity, s.state \
    FROM outbound_lines l \
    JOIN outbound_movements s ON s.id = l.movement_id \
    JOIN materials m ON m.code = l.material_code";

pub struct ReportRepo;

impl ReportRepo {
    async fn count(pool: &MySqlPool, query: &str, bind: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(query).bind(bind).fetch_one(pool).await?;
        Ok(count)
    }

    pub async fn notifications(pool: &MySqlPool) -> Result<Notifications, sqlx::Error> {
        Ok(Notifications {
            active_alerts: Self::count(
                pool,
                "SELECT COUNT(*) FROM alerts WHERE state = ?",
                STATE_ACTIVE,
            )
            .await?,
            pending_inbound: Self::count(
                pool,
                "SELECT COUNT(*) FROM inbound_movements WHERE state = ?",
                STATE_PENDING,
            )
            .await?,
            pending_outbound: Self::count(
                pool,
                "SELECT COUNT(*) FROM outbound_movements WHERE state = ?",
                STATE_PENDING,
            )
            .await?,
        })
    }

    pub async fn stock_totals(pool: &MySqlPool) -> Result<StockTotals, sqlx::Error> {
        sqlx::query_as::<_, StockTotals>(
            "SELECT COUNT(*) AS material_count, \
                    CAST(COALESCE(SUM(stock_current), 0) AS SIGNED) AS stock_total, \
                    CAST(COALESCE(SUM(stock_current - stock_reserved), 0) AS SIGNED) AS stock_available \
             FROM materials WHERE active = TRUE",
        )
        .fetch_one(pool)
        .await
    }

    pub async fn stock_by_category(pool: &MySqlPool) -> Result<Vec<CategoryStock>, sqlx::Error> {
        sqlx::query_as::<_, CategoryStock>(
            "SELECT COALESCE(c.name, 'Sin categoria') AS category, \
                    CAST(SUM(m.stock_current) AS SIGNED) AS stock_total \
             FROM materials m \
             LEFT JOIN categories c ON c.id = m.category_id \
             WHERE m.active = TRUE \
             GROUP BY c.name \
             ORDER BY category",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn dashboard(pool: &MySqlPool, today: Date) -> Result<Dashboard, sqlx::Error> {
        let totals = Self::stock_totals(pool).await?;

        let (active, unseen): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), CAST(COALESCE(SUM(seen = FALSE), 0) AS SIGNED) \
             FROM alerts WHERE state = ?",
        )
        .bind(STATE_ACTIVE)
        .fetch_one(pool)
        .await?;

        let notifications = Self::notifications(pool).await?;

        let (inbound_today,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM inbound_movements WHERE movement_date = ?")
                .bind(today)
                .fetch_one(pool)
                .await?;
        let (outbound_today,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM outbound_movements WHERE movement_date = ?")
                .bind(today)
                .fetch_one(pool)
                .await?;

        Ok(Dashboard {
            totals,
            alerts: AlertCounters { active, unseen },
            pending: PendingApprovals {
                inbound: notifications.pending_inbound,
                outbound: notifications.pending_outbound,
            },
            today: MovementsToday {
                inbound: inbound_today,
                outbound: outbound_today,
                total: inbound_today + outbound_today,
            },
            stock_by_category: Self::stock_by_category(pool).await?,
        })
    }

    pub async fn history(
        pool: &MySqlPool,
        filter: &HistoryFilter,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let (from, to) = filter.range.unzip();
        let query = format!(
            "SELECT * FROM ({HISTORY_SOURCE}) h \
             WHERE (? IS NULL OR h.material_code LIKE ? OR h.description LIKE ?) \
               AND (? IS NULL OR h.kind = ?) \
               AND (? IS NULL OR h.date BETWEEN ? AND ?) \
             ORDER BY h.date DESC, h.movement_id DESC, h.material_code"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(pattern.as_deref())
            .bind(pattern.as_deref())
            .bind(pattern.as_deref())
            .bind(filter.kind.as_deref())
            .bind(filter.kind.as_deref())
            .bind(from)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    pub async fn history_totals(pool: &MySqlPool) -> Result<Vec<HistoryTotal>, sqlx::Error> {
        let query = format!(
            "SELECT h.kind, COUNT(DISTINCT h.movement_id) AS movements, \
                    CAST(COALESCE(SUM(h.quantity), 0) AS SIGNED) AS quantity \
             FROM ({HISTORY_SOURCE}) h \
             GROUP BY h.kind \
             ORDER BY h.kind"
        );
        sqlx::query_as::<_, HistoryTotal>(&query)
            .fetch_all(pool)
            .await
    }
}

#[async_trait]
impl ReportStore for MySqlStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(self.pool()).await?)
    }

    async fn notifications(&self) -> StoreResult<Notifications> {
        Ok(ReportRepo::notifications(self.pool()).await?)
    }

    async fn stock_totals(&self) -> StoreResult<StockTotals> {
        Ok(ReportRepo::stock_totals(self.pool()).await?)
    }

    async fn dashboard(&self, today: Date) -> StoreResult<Dashboard> {
        Ok(ReportRepo::dashboard(self.pool(), today).await?)
    }

    async fn history(&self, filter: &HistoryFilter) -> StoreResult<Vec<HistoryEntry>> {
        Ok(ReportRepo::history(self.pool(), filter).await?)
    }

    async fn history_totals(&self) -> StoreResult<Vec<HistoryTotal>> {
        Ok(ReportRepo::history_totals(self.pool()).await?)
    }
}
