use std::cmp::Ordering;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Thresholds;
use crate::fetcher::{MarketDataProvider, ProviderError};
use crate::indicators::{self, IndicatorError};
use crate::latency::LatencyStats;
use crate::scorer::CriteriaEvaluator;
use crate::types::{
    tier_for, Fundamentals, PriceSeries, ScanReport, Score, SymbolReport, Tier, WatchlistEntry,
};

pub struct ScanSettings {
    pub thresholds: Thresholds,
    pub history_range: String,
    /// Max in-flight fetches. Scoring itself is always sequential.
    pub concurrency: usize,
}

/// Runs one scan: fetch every symbol, compute indicators, evaluate criteria, tier.
pub struct Scanner<P> {
    provider: P,
    settings: ScanSettings,
    evaluator: CriteriaEvaluator,
    latency: LatencyStats,
}

impl<P: MarketDataProvider> Scanner<P> {
    pub fn new(provider: P, settings: ScanSettings) -> Self {
        let evaluator = CriteriaEvaluator::new(&settings.thresholds);
        Self {
            provider,
            settings,
            evaluator,
            latency: LatencyStats::new(),
        }
    }

    pub fn latency(&self) -> &LatencyStats {
        &self.latency
    }

    pub async fn run(&self, watchlist: &[WatchlistEntry]) -> ScanReport {
        let started_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        info!(symbols = watchlist.len(), concurrency = self.settings.concurrency, "Scan started");

        // `buffered` keeps watchlist order while allowing parallel fetches.
        let fetched: Vec<_> = stream::iter(watchlist)
            .map(|entry| async move { (entry, self.fetch(&entry.symbol).await) })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut symbols: Vec<SymbolReport> = fetched
            .into_iter()
            .map(|(entry, data)| match data {
                Ok((series, fundamentals)) => self.score_symbol(entry, &series, fundamentals),
                Err(e) => {
                    warn!(symbol = %entry.symbol, "Data unavailable: {e}");
                    SymbolReport::unscored(entry, format!("data unavailable: {e}"))
                }
            })
            .collect();

        symbols.sort_by(compare_reports);

        let report = ScanReport { started_at, symbols };
        info!(
            signals = report.count(Tier::Signal),
            near_misses = report.count(Tier::NearMiss),
            other = report.count(Tier::Other),
            unscored = report.count(Tier::Unscored),
            "Scan complete"
        );
        report
    }

    async fn fetch(&self, symbol: &str) -> Result<(PriceSeries, Fundamentals), ProviderError> {
        let started = Instant::now();
        let result = self.fetch_uninstrumented(symbol).await;
        self.latency.record(started.elapsed());
        result
    }

    async fn fetch_uninstrumented(&self, symbol: &str) -> Result<(PriceSeries, Fundamentals), ProviderError> {
        let series = self
            .provider
            .fetch_price_history(symbol, &self.settings.history_range)
            .await?;
        if series.is_empty() {
            return Err(ProviderError::Empty);
        }
        let fundamentals = self.provider.fetch_fundamentals(symbol).await?;
        Ok((series, fundamentals))
    }

    /// Indicators and criteria for one symbol. Pure apart from logging.
    pub fn score_symbol(
        &self,
        entry: &WatchlistEntry,
        series: &PriceSeries,
        fundamentals: Fundamentals,
    ) -> SymbolReport {
        let indicators = match indicators::compute(series, &self.settings.thresholds) {
            Ok(set) => set,
            Err(IndicatorError::DataInsufficient(_)) => {
                return SymbolReport::unscored(entry, "data unavailable: empty price history");
            }
        };

        let record = self.evaluator.evaluate(&indicators, &fundamentals);
        let tier = tier_for(&record);
        let reason = (record.score == Score::Vacuous).then(|| "no criteria could be evaluated".to_string());

        debug!(
            symbol = %entry.symbol,
            rsi = ?indicators.rsi,
            trend = ?indicators.trend,
            applicable = record.applicable,
            passed = record.passed,
            tier = %tier,
            "Symbol scored"
        );

        SymbolReport {
            symbol: entry.symbol.clone(),
            market: entry.market,
            tier,
            indicators: Some(indicators),
            fundamentals: Some(fundamentals),
            score: Some(record),
            reason,
        }
    }
}

/// Tier in report order, then score descending, then symbol ascending.
fn compare_reports(a: &SymbolReport, b: &SymbolReport) -> Ordering {
    a.tier
        .cmp(&b.tier)
        .then_with(|| match (a.score_percent(), b.score_percent()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.symbol.cmp(&b.symbol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CriterionKind, InapplicableReason, MarketGroup, Outcome, ScoreRecord};
    use std::collections::HashMap;

    /// Scripted provider: per-symbol closes and fundamentals, or a failure.
    #[derive(Default)]
    struct FakeProvider {
        closes: HashMap<String, Vec<f64>>,
        fundamentals: HashMap<String, Fundamentals>,
    }

    impl FakeProvider {
        fn with(mut self, symbol: &str, closes: Vec<f64>, fundamentals: Fundamentals) -> Self {
            self.closes.insert(symbol.to_string(), closes);
            self.fundamentals.insert(symbol.to_string(), fundamentals);
            self
        }
    }

    impl MarketDataProvider for FakeProvider {
        async fn fetch_price_history(&self, symbol: &str, _range: &str) -> Result<PriceSeries, ProviderError> {
            self.closes
                .get(symbol)
                .map(|c| PriceSeries::from_closes(symbol, c))
                .ok_or(ProviderError::Status(404))
        }

        async fn fetch_fundamentals(&self, symbol: &str) -> Result<Fundamentals, ProviderError> {
            self.fundamentals.get(symbol).cloned().ok_or(ProviderError::Status(404))
        }
    }

    fn entry(symbol: &str) -> WatchlistEntry {
        WatchlistEntry { symbol: symbol.to_string(), market: MarketGroup::Custom }
    }

    fn scanner(provider: FakeProvider) -> Scanner<FakeProvider> {
        Scanner::new(
            provider,
            ScanSettings { thresholds: Thresholds::default(), history_range: "1y".to_string(), concurrency: 3 },
        )
    }

    /// 250 rising closes, then 20 falling ones: oversold but still above the 200-day mean.
    fn dip_in_uptrend() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64).collect();
        closes.extend((1..=20).map(|k| 349.0 - 2.0 * k as f64));
        closes
    }

    fn tech_value() -> Fundamentals {
        Fundamentals {
            trailing_pe: Some(12.0),
            price_to_book: Some(1.1),
            return_on_equity: None,
            revenue_growth: Some(0.09),
            debt_to_equity: Some(20.0),
            sector: Some("Technology".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn end_to_end_signal() {
        let s = scanner(FakeProvider::default().with("DIP", dip_in_uptrend(), tech_value()));
        let report = s.run(&[entry("DIP")]).await;

        let dip = &report.symbols[0];
        assert_eq!(dip.tier, Tier::Signal);
        let record = dip.score.as_ref().unwrap();
        assert_eq!(record.applicable, 5);
        assert_eq!(record.passed, 5);
        assert_eq!(
            record.result(CriterionKind::PriceToBook).map(|r| r.outcome),
            Some(Outcome::Inapplicable(InapplicableReason::SectorExempt))
        );
        assert!(dip.indicators.unwrap().rsi.unwrap() < 30.0);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_scan() {
        let s = scanner(FakeProvider::default().with("DIP", dip_in_uptrend(), tech_value()));
        let report = s.run(&[entry("MISSING"), entry("DIP")]).await;

        assert_eq!(report.symbols.len(), 2);
        assert_eq!(report.count(Tier::Signal), 1);
        let missing = report.symbols.iter().find(|r| r.symbol == "MISSING").unwrap();
        assert_eq!(missing.tier, Tier::Unscored);
        assert!(missing.reason.as_deref().unwrap().contains("data unavailable"));
        assert_eq!(s.latency().len(), 2);
    }

    #[tokio::test]
    async fn empty_history_is_unscored() {
        let s = scanner(FakeProvider::default().with("EMPTY", vec![], tech_value()));
        let report = s.run(&[entry("EMPTY")]).await;
        assert_eq!(report.symbols[0].tier, Tier::Unscored);
        assert!(report.symbols[0].score.is_none());
    }

    #[tokio::test]
    async fn vacuous_symbol_is_flagged_not_signalled() {
        let s = scanner(FakeProvider::default().with("TINY", vec![10.0, 10.5, 10.2], Fundamentals::default()));
        let report = s.run(&[entry("TINY")]).await;
        let tiny = &report.symbols[0];
        assert_eq!(tiny.tier, Tier::Unscored);
        assert_eq!(tiny.score.as_ref().map(|r| r.score), Some(Score::Vacuous));
        assert_eq!(tiny.reason.as_deref(), Some("no criteria could be evaluated"));
    }

    #[tokio::test]
    async fn results_sorted_by_tier_score_then_symbol() {
        let weak = Fundamentals {
            trailing_pe: Some(60.0),
            price_to_book: Some(9.0),
            sector: Some("Industrials".to_string()),
            ..Default::default()
        };
        let provider = FakeProvider::default()
            .with("BBB", dip_in_uptrend(), tech_value())
            .with("AAA", dip_in_uptrend(), tech_value())
            .with("CCC", dip_in_uptrend(), weak);
        let s = scanner(provider);
        let report = s.run(&[entry("CCC"), entry("NOPE"), entry("BBB"), entry("AAA")]).await;

        let order: Vec<_> = report.symbols.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["AAA", "BBB", "CCC", "NOPE"]);
        assert_eq!(report.symbols[2].tier, Tier::Other);
    }

    fn scored(symbol: &str, applicable: u32, passed: u32) -> SymbolReport {
        let record = ScoreRecord {
            applicable,
            passed,
            score: Score::Percent(passed as f64 / applicable as f64 * 100.0),
            results: Vec::new(),
        };
        SymbolReport {
            symbol: symbol.to_string(),
            market: MarketGroup::Custom,
            tier: tier_for(&record),
            indicators: None,
            fundamentals: None,
            score: Some(record),
            reason: None,
        }
    }

    #[test]
    fn near_miss_sorts_before_higher_scoring_other() {
        // 1 of 2 passed is a near-miss at 50%; 5 of 7 is "other" at about 71%.
        let mut reports = vec![scored("OTHER", 7, 5), scored("NEAR", 2, 1), scored("SIG", 3, 3)];
        reports.sort_by(compare_reports);

        let order: Vec<_> = reports.iter().map(|r| (r.symbol.as_str(), r.tier)).collect();
        assert_eq!(
            order,
            vec![("SIG", Tier::Signal), ("NEAR", Tier::NearMiss), ("OTHER", Tier::Other)]
        );
    }
}
