mod config;
mod db;
mod diff;
mod error;
mod fetcher;
mod indicators;
mod latency;
mod scan;
mod scorer;
mod types;
mod watchlist;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::ScanStore;
use crate::diff::{diff_scans, ScanDiff};
use crate::error::Result;
use crate::fetcher::YahooProvider;
use crate::scan::{ScanSettings, Scanner};
use crate::types::{ScanReport, SymbolReport, Tier};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let t = &cfg.thresholds;
    info!(
        "Criteria: RSI<{} | close>SMA{} (min {} closes) | P/E<{} | P/B<{} (exempt: {}) | ROE>{:.0}% or growth>{:.0}% | D/E<{} (exempt: {})",
        t.rsi_oversold,
        t.trend_period,
        t.trend_min_periods,
        t.max_pe,
        t.max_pb,
        t.pb_exempt_sectors.join(", "),
        t.min_roe * 100.0,
        t.min_revenue_growth * 100.0,
        t.max_debt_to_equity,
        t.de_exempt_sectors.join(", "),
    );

    // --- Scan ---
    let provider = YahooProvider::new(&cfg.yahoo_api_url)?;
    let scanner = Scanner::new(
        provider,
        ScanSettings {
            thresholds: cfg.thresholds.clone(),
            history_range: cfg.history_range.clone(),
            concurrency: cfg.scan_concurrency,
        },
    );
    let report = scanner.run(&cfg.watchlist).await;

    if let Some((p50, p95, p99)) = scanner.latency().percentiles() {
        info!(
            samples = scanner.latency().len(),
            "Fetch latency p50={p50}ms p95={p95}ms p99={p99}ms"
        );
    }

    log_summary(&report);
    publish(&report, cfg.report_path.as_deref(), &cfg.db_path).await
}

/// Write the JSON report, then record history and log the diff. History is
/// best effort: a database failure is logged and never blocks the report.
async fn publish(report: &ScanReport, report_path: Option<&str>, db_path: &str) -> Result<()> {
    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json)?;
        info!("Report written to {path}");
    }

    if let Err(e) = record_history(report, db_path).await {
        warn!("Scan history unavailable at {db_path}: {e}");
    }
    Ok(())
}

async fn record_history(report: &ScanReport, db_path: &str) -> Result<()> {
    let store = ScanStore::connect(db_path).await?;
    let scan_id = store.record_scan(report).await?;
    info!(
        "Scan {scan_id} recorded at {db_path} ({} scans retained)",
        store.scan_count().await?
    );

    match store.previous_scan(scan_id).await? {
        Some(prev) => {
            let rows = store.results(prev.id).await?;
            info!(
                "Previous scan {} ({} symbols, {} signals, {} near-misses)",
                prev.id, prev.symbol_count, prev.signal_count, prev.near_miss_count
            );
            log_diff(&diff_scans(&rows, report));
        }
        None => info!("No previous scan to compare against"),
    }
    Ok(())
}

fn log_summary(report: &ScanReport) {
    info!(
        "[SUMMARY] {} symbols: {} signals, {} near-misses, {} other, {} unscored",
        report.symbols.len(),
        report.count(Tier::Signal),
        report.count(Tier::NearMiss),
        report.count(Tier::Other),
        report.count(Tier::Unscored),
    );

    for s in report.in_tier(Tier::Signal) {
        info!("[SIGNAL]    {}", describe(s));
    }
    for s in report.in_tier(Tier::NearMiss) {
        let missed = s
            .score
            .as_ref()
            .map(|r| {
                r.results
                    .iter()
                    .filter(|c| c.is_applicable() && !c.is_passed())
                    .map(|c| c.criterion.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        info!("[NEAR MISS] {} | missed: {missed}", describe(s));
    }
    for s in report.in_tier(Tier::Unscored) {
        warn!(
            "[UNSCORED]  {} | {}",
            s.symbol,
            s.reason.as_deref().unwrap_or("unknown")
        );
    }
}

/// One-line symbol description for the summary log.
fn describe(s: &SymbolReport) -> String {
    let fmt = |v: Option<f64>, scale: f64, suffix: &str| match v {
        Some(x) => format!("{:.1}{suffix}", x * scale),
        None => "n/a".to_string(),
    };
    let f = s.fundamentals.clone().unwrap_or_default();
    let rsi = s.indicators.and_then(|i| i.rsi);

    format!(
        "{} ({}) [{}] score {} | RSI {} | P/E {} | P/B {} | ROE {} | growth {} | D/E {} | FCF yield {}",
        s.symbol,
        s.name(),
        s.market,
        fmt(s.score_percent(), 1.0, "%"),
        fmt(rsi, 1.0, ""),
        fmt(f.trailing_pe, 1.0, ""),
        fmt(f.price_to_book, 1.0, ""),
        fmt(f.return_on_equity, 100.0, "%"),
        fmt(f.revenue_growth, 100.0, "%"),
        fmt(f.debt_to_equity, 1.0, ""),
        fmt(f.fcf_yield(), 1.0, "%"),
    )
}

fn log_diff(diff: &ScanDiff) {
    if diff.is_empty() {
        info!("[DIFF] no changes since previous scan");
        return;
    }
    info!(
        new_signals = diff.new_signals.len(),
        dropped_signals = diff.dropped_signals.len(),
        new_near_misses = diff.new_near_misses.len(),
        tier_changes = diff.tier_changes,
        "[DIFF] changes since previous scan"
    );
    if !diff.new_signals.is_empty() {
        info!("[DIFF] new signals: {}", diff.new_signals.join(", "));
    }
    if !diff.dropped_signals.is_empty() {
        info!("[DIFF] dropped signals: {}", diff.dropped_signals.join(", "));
    }
    if !diff.new_near_misses.is_empty() {
        info!("[DIFF] new near-misses: {}", diff.new_near_misses.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketGroup, WatchlistEntry};

    fn report() -> ScanReport {
        let entry = WatchlistEntry { symbol: "AAPL".to_string(), market: MarketGroup::Sp500 };
        ScanReport {
            started_at: 1_700_000_000,
            symbols: vec![SymbolReport::unscored(&entry, "data unavailable: no data returned")],
        }
    }

    #[tokio::test]
    async fn report_is_written_when_history_database_is_unavailable() {
        let path = std::env::temp_dir().join(format!("dip-scanner-report-{}.json", std::process::id()));
        let path_str = path.to_string_lossy().into_owned();

        publish(&report(), Some(&path_str), "/nonexistent/dir/scanner.db")
            .await
            .unwrap();

        let written: ScanReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.symbols.len(), 1);
        assert_eq!(written.symbols[0].symbol, "AAPL");
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn unreachable_history_database_is_an_error_for_history_only() {
        assert!(record_history(&report(), "/nonexistent/dir/scanner.db").await.is_err());
    }
}
