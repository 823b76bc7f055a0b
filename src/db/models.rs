//! Row types for the scan history tables in `migrations/`.

use crate::types::Tier;

#[derive(Debug, sqlx::FromRow)]
pub struct ScanRow {
    pub id: i64,
    pub started_at: i64,
    pub symbol_count: i64,
    pub signal_count: i64,
    pub near_miss_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanResultRow {
    pub scan_id: i64,
    pub symbol: String,
    pub market: String,
    pub tier: String,
    pub applicable: Option<i64>,
    pub passed: Option<i64>,
    pub score: Option<f64>,
    pub rsi: Option<f64>,
    pub reason: Option<String>,
}

impl ScanResultRow {
    /// None if the stored label is not a known tier.
    pub fn tier(&self) -> Option<Tier> {
        self.tier.parse().ok()
    }
}
