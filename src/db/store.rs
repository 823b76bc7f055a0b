use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::config::SCAN_HISTORY_KEEP;
use crate::db::models::{ScanResultRow, ScanRow};
use crate::error::Result;
use crate::types::{ScanReport, Tier};

/// Scan history. Only the most recent `SCAN_HISTORY_KEEP` scans are retained;
/// they exist so each run can be diffed against the previous one.
pub struct ScanStore {
    pool: SqlitePool,
}

impl ScanStore {
    pub async fn connect(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Wrap an existing pool and apply migrations.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Persist a scan and prune older history. Returns the new scan id.
    pub async fn record_scan(&self, report: &ScanReport) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let scan_id = sqlx::query(
            r#"
            INSERT INTO scans (started_at, symbol_count, signal_count, near_miss_count)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(report.started_at)
        .bind(report.symbols.len() as i64)
        .bind(report.count(Tier::Signal) as i64)
        .bind(report.count(Tier::NearMiss) as i64)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for s in &report.symbols {
            let tier = s.tier.to_string();
            let market = s.market.to_string();
            let applicable = s.score.as_ref().map(|r| r.applicable as i64);
            let passed = s.score.as_ref().map(|r| r.passed as i64);
            let rsi = s.indicators.and_then(|i| i.rsi);

            sqlx::query(
                r#"
                INSERT INTO scan_results (
                    scan_id, symbol, market, tier, applicable, passed, score, rsi, reason
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(scan_id)
            .bind(s.symbol.as_str())
            .bind(market)
            .bind(tier)
            .bind(applicable)
            .bind(passed)
            .bind(s.score_percent())
            .bind(rsi)
            .bind(s.reason.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        let pruned = sqlx::query(
            r#"
            DELETE FROM scan_results
            WHERE scan_id NOT IN (SELECT id FROM scans ORDER BY id DESC LIMIT ?)
            "#,
        )
        .bind(SCAN_HISTORY_KEEP)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query("DELETE FROM scans WHERE id NOT IN (SELECT id FROM scans ORDER BY id DESC LIMIT ?)")
            .bind(SCAN_HISTORY_KEEP)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(scan_id, pruned, "Scan recorded");
        Ok(scan_id)
    }

    /// The scan immediately before `scan_id`, if one is retained.
    pub async fn previous_scan(&self, scan_id: i64) -> Result<Option<ScanRow>> {
        let row = sqlx::query_as::<_, ScanRow>(
            r#"
            SELECT id, started_at, symbol_count, signal_count, near_miss_count
            FROM scans
            WHERE id < ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(scan_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn results(&self, scan_id: i64) -> Result<Vec<ScanResultRow>> {
        let rows = sqlx::query_as::<_, ScanResultRow>(
            r#"
            SELECT scan_id, symbol, market, tier, applicable, passed, score, rsi, reason
            FROM scan_results
            WHERE scan_id = ?
            ORDER BY symbol
            "#,
        )
        .bind(scan_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn scan_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scans")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
