use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::types::WatchlistEntry;
use crate::watchlist;

pub const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com";

/// Page that hands out the session cookie Yahoo requires before issuing a crumb.
pub const YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";

/// RSI lookback in periods.
pub const RSI_PERIOD: usize = 14;

/// HTTP timeout for a single provider request (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Retry backoff for transient provider failures, in milliseconds.
pub const FETCH_BACKOFF_MS: &[u64] = &[250, 500, 1000];

/// Number of scans retained in the history table for diffing.
pub const SCAN_HISTORY_KEEP: i64 = 2;

pub const DEFAULT_PB_EXEMPT_SECTORS: &[&str] = &["Technology", "Communication Services", "Healthcare"];
pub const DEFAULT_DE_EXEMPT_SECTORS: &[&str] = &["Financial Services", "Real Estate", "Utilities"];

/// Scoring cutoffs and sector exemptions. Built once per scan and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// RSI must be strictly below this.
    pub rsi_oversold: f64,
    pub max_pe: f64,
    pub max_pb: f64,
    /// Fraction, 0.10 = 10%.
    pub min_roe: f64,
    /// Fraction, 0.05 = 5%.
    pub min_revenue_growth: f64,
    /// Percent, 100.0 = 1.0x.
    pub max_debt_to_equity: f64,
    pub pb_exempt_sectors: Vec<String>,
    pub de_exempt_sectors: Vec<String>,
    pub trend_period: usize,
    /// Below this many closes the trend indicator is inapplicable.
    pub trend_min_periods: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            max_pe: 25.0,
            max_pb: 3.0,
            min_roe: 0.10,
            min_revenue_growth: 0.05,
            max_debt_to_equity: 100.0,
            pb_exempt_sectors: DEFAULT_PB_EXEMPT_SECTORS.iter().map(|s| s.to_string()).collect(),
            de_exempt_sectors: DEFAULT_DE_EXEMPT_SECTORS.iter().map(|s| s.to_string()).collect(),
            trend_period: 200,
            trend_min_periods: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    /// Write the scan result as JSON here when set (REPORT_PATH).
    pub report_path: Option<String>,
    pub yahoo_api_url: String,
    /// Max in-flight provider requests (SCAN_CONCURRENCY)
    pub scan_concurrency: usize,
    /// Yahoo chart range for price history, e.g. "1y" (HISTORY_RANGE)
    pub history_range: String,
    pub watchlist: Vec<WatchlistEntry>,
    pub thresholds: Thresholds,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Thresholds::default();

        let thresholds = Thresholds {
            rsi_oversold: parse_threshold(&lookup, "RSI_OVERSOLD", defaults.rsi_oversold)?,
            max_pe: parse_threshold(&lookup, "MAX_PE", defaults.max_pe)?,
            max_pb: parse_threshold(&lookup, "MAX_PB", defaults.max_pb)?,
            min_roe: parse_threshold(&lookup, "MIN_ROE", defaults.min_roe)?,
            min_revenue_growth: parse_threshold(&lookup, "MIN_REVENUE_GROWTH", defaults.min_revenue_growth)?,
            max_debt_to_equity: parse_threshold(&lookup, "MAX_DEBT_TO_EQUITY", defaults.max_debt_to_equity)?,
            pb_exempt_sectors: lookup("PB_EXEMPT_SECTORS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.pb_exempt_sectors),
            de_exempt_sectors: lookup("DE_EXEMPT_SECTORS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.de_exempt_sectors),
            trend_period: parse_or(&lookup, "TREND_PERIOD", defaults.trend_period)?,
            trend_min_periods: parse_or(&lookup, "TREND_MIN_PERIODS", defaults.trend_min_periods)?,
        };

        if thresholds.trend_period == 0 || thresholds.trend_min_periods == 0 {
            return Err(AppError::Config("TREND_PERIOD and TREND_MIN_PERIODS must be positive".to_string()));
        }
        if thresholds.trend_min_periods > thresholds.trend_period {
            return Err(AppError::Config(
                "TREND_MIN_PERIODS must not exceed TREND_PERIOD".to_string(),
            ));
        }

        let scan_concurrency: usize = parse_or(&lookup, "SCAN_CONCURRENCY", 4)?;
        if scan_concurrency == 0 {
            return Err(AppError::Config("SCAN_CONCURRENCY must be at least 1".to_string()));
        }

        let watchlist = match lookup("WATCHLIST") {
            Some(v) if !v.trim().is_empty() => watchlist::from_symbols(&split_list(&v)),
            _ => watchlist::registry(),
        };

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db_path: lookup("DB_PATH").unwrap_or_else(|| "scanner.db".to_string()),
            report_path: lookup("REPORT_PATH").filter(|s| !s.trim().is_empty()),
            yahoo_api_url: lookup("YAHOO_API_URL").unwrap_or_else(|| YAHOO_API_URL.to_string()),
            scan_concurrency,
            history_range: lookup("HISTORY_RANGE").unwrap_or_else(|| "1y".to_string()),
            watchlist,
            thresholds,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

/// `parse_or` for float cutoffs. `NaN` and infinities are rejected.
fn parse_threshold<F>(lookup: &F, key: &str, default: f64) -> Result<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let value: f64 = parse_or(lookup, key, default)?;
    if !value.is_finite() {
        return Err(AppError::Config(format!("{key} must be a finite number, got {value}")));
    }
    Ok(value)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        let t = &cfg.thresholds;
        assert_eq!(t.rsi_oversold, 30.0);
        assert_eq!(t.max_pe, 25.0);
        assert_eq!(t.max_pb, 3.0);
        assert_eq!(t.min_roe, 0.10);
        assert_eq!(t.min_revenue_growth, 0.05);
        assert_eq!(t.max_debt_to_equity, 100.0);
        assert_eq!(t.trend_period, 200);
        assert_eq!(t.trend_min_periods, 50);
        assert!(t.pb_exempt_sectors.iter().any(|s| s == "Technology"));
        assert_eq!(cfg.scan_concurrency, 4);
        assert!(cfg.report_path.is_none());
        assert_eq!(cfg.watchlist, watchlist::registry());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("RSI_OVERSOLD", "35"),
            ("MAX_PE", " 18.5 "),
            ("DE_EXEMPT_SECTORS", "Financial Services, Insurance ,"),
            ("WATCHLIST", "AAPL, ZZZZ"),
            ("REPORT_PATH", "out.json"),
        ]))
        .unwrap();
        assert_eq!(cfg.thresholds.rsi_oversold, 35.0);
        assert_eq!(cfg.thresholds.max_pe, 18.5);
        assert_eq!(cfg.thresholds.de_exempt_sectors, vec!["Financial Services", "Insurance"]);
        assert_eq!(cfg.watchlist.len(), 2);
        assert_eq!(cfg.watchlist[0].symbol, "AAPL");
        assert_eq!(cfg.report_path.as_deref(), Some("out.json"));
    }

    #[test]
    fn malformed_number_is_config_error() {
        let err = Config::from_lookup(lookup_from(&[("MAX_PB", "three")])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("MAX_PB")));
    }

    #[test]
    fn non_finite_threshold_is_config_error() {
        for raw in ["NaN", "inf", "-infinity"] {
            let err = Config::from_lookup(lookup_from(&[("RSI_OVERSOLD", raw)])).unwrap_err();
            assert!(matches!(&err, AppError::Config(msg) if msg.contains("RSI_OVERSOLD")), "{raw}: {err}");
        }
        assert!(Config::from_lookup(lookup_from(&[("MAX_DEBT_TO_EQUITY", "NaN")])).is_err());
    }

    #[test]
    fn trend_minimum_cannot_exceed_period() {
        let err = Config::from_lookup(lookup_from(&[("TREND_PERIOD", "20"), ("TREND_MIN_PERIODS", "50")]))
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("SCAN_CONCURRENCY", "0")])).is_err());
    }
}
