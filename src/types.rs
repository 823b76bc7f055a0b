use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Watchlist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketGroup {
    Sp500,
    Dax,
    Mdax,
    Sdax,
    Cac40,
    Ftse100,
    Aex,
    Smi,
    Japan,
    Korea,
    China,
    Australia,
    India,
    Nordic,
    SouthernEurope,
    Canada,
    /// Symbol supplied through the WATCHLIST override and not found in the registry.
    Custom,
}

impl std::fmt::Display for MarketGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketGroup::Sp500 => "sp500",
            MarketGroup::Dax => "dax",
            MarketGroup::Mdax => "mdax",
            MarketGroup::Sdax => "sdax",
            MarketGroup::Cac40 => "cac40",
            MarketGroup::Ftse100 => "ftse100",
            MarketGroup::Aex => "aex",
            MarketGroup::Smi => "smi",
            MarketGroup::Japan => "japan",
            MarketGroup::Korea => "korea",
            MarketGroup::China => "china",
            MarketGroup::Australia => "australia",
            MarketGroup::India => "india",
            MarketGroup::Nordic => "nordic",
            MarketGroup::SouthernEurope => "southern_europe",
            MarketGroup::Canada => "canada",
            MarketGroup::Custom => "custom",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub market: MarketGroup,
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix epoch seconds of the trading day.
    pub date: i64,
    pub close: f64,
}

/// Daily closes for one symbol, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn from_closes(symbol: &str, closes: &[f64]) -> Self {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint { date: i as i64 * 86_400, close })
            .collect();
        Self { symbol: symbol.to_string(), points }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Company snapshot from the data provider. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    /// Fraction, 0.12 = 12%.
    pub return_on_equity: Option<f64>,
    /// Fraction, 0.05 = 5%.
    pub revenue_growth: Option<f64>,
    /// Percent as reported by the provider, 100.0 = 1.0x.
    pub debt_to_equity: Option<f64>,
    pub sector: Option<String>,
    pub short_name: Option<String>,
    pub market_cap: Option<f64>,
    pub free_cashflow: Option<f64>,
}

impl Fundamentals {
    /// Free cash flow yield in percent.
    pub fn fcf_yield(&self) -> Option<f64> {
        match (self.free_cashflow, self.market_cap) {
            (Some(fcf), Some(mcap)) if mcap > 0.0 => Some(fcf / mcap * 100.0),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub last_close: f64,
    /// None when the series is too short for RSI.
    pub rsi: Option<f64>,
    /// None when the series is shorter than the trend minimum.
    pub trend: Option<f64>,
    pub above_trend: Option<bool>,
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    RsiOversold,
    TrendConfirmation,
    Valuation,
    PriceToBook,
    QualityOrGrowth,
    Leverage,
}

impl std::fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CriterionKind::RsiOversold => "rsi_oversold",
            CriterionKind::TrendConfirmation => "trend_confirmation",
            CriterionKind::Valuation => "valuation",
            CriterionKind::PriceToBook => "price_to_book",
            CriterionKind::QualityOrGrowth => "quality_or_growth",
            CriterionKind::Leverage => "leverage",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InapplicableReason {
    /// The symbol's sector is in the criterion's exemption set.
    SectorExempt,
    /// A required input was absent or too short to compute.
    MissingData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Inapplicable(InapplicableReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: CriterionKind,
    pub outcome: Outcome,
}

impl CriterionResult {
    pub fn is_applicable(&self) -> bool {
        !matches!(self.outcome, Outcome::Inapplicable(_))
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

// ---------------------------------------------------------------------------
// Scores and tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    /// passed / applicable, 0 to 100.
    Percent(f64),
    /// No criterion could be evaluated.
    Vacuous,
}

impl Score {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Score::Percent(p) => Some(*p),
            Score::Vacuous => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub applicable: u32,
    pub passed: u32,
    pub score: Score,
    pub results: Vec<CriterionResult>,
}

impl ScoreRecord {
    /// Applicable criteria that did not pass.
    pub fn missed(&self) -> u32 {
        self.applicable - self.passed
    }

    pub fn result(&self, criterion: CriterionKind) -> Option<&CriterionResult> {
        self.results.iter().find(|r| r.criterion == criterion)
    }
}

/// Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Every applicable criterion passed.
    Signal,
    /// Exactly one applicable criterion failed.
    NearMiss,
    Other,
    /// Data unavailable or no applicable criteria.
    Unscored,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Signal => "signal",
            Tier::NearMiss => "near_miss",
            Tier::Other => "other",
            Tier::Unscored => "unscored",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signal" => Ok(Tier::Signal),
            "near_miss" => Ok(Tier::NearMiss),
            "other" => Ok(Tier::Other),
            "unscored" => Ok(Tier::Unscored),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

/// Tier for a score record. Records with zero applicable criteria are never signals.
pub fn tier_for(record: &ScoreRecord) -> Tier {
    match (record.applicable, record.missed()) {
        (0, _) => Tier::Unscored,
        (_, 0) => Tier::Signal,
        (_, 1) => Tier::NearMiss,
        _ => Tier::Other,
    }
}

// ---------------------------------------------------------------------------
// Scan output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub market: MarketGroup,
    pub tier: Tier,
    pub indicators: Option<IndicatorSet>,
    pub fundamentals: Option<Fundamentals>,
    pub score: Option<ScoreRecord>,
    /// Set when the symbol could not be scored.
    pub reason: Option<String>,
}

impl SymbolReport {
    pub fn unscored(entry: &WatchlistEntry, reason: impl Into<String>) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            market: entry.market,
            tier: Tier::Unscored,
            indicators: None,
            fundamentals: None,
            score: None,
            reason: Some(reason.into()),
        }
    }

    pub fn score_percent(&self) -> Option<f64> {
        self.score.as_ref().and_then(|s| s.score.percent())
    }

    pub fn name(&self) -> &str {
        self.fundamentals
            .as_ref()
            .and_then(|f| f.short_name.as_deref())
            .unwrap_or(&self.symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Unix epoch seconds when the scan started.
    pub started_at: i64,
    pub symbols: Vec<SymbolReport>,
}

impl ScanReport {
    pub fn in_tier(&self, tier: Tier) -> impl Iterator<Item = &SymbolReport> {
        self.symbols.iter().filter(move |s| s.tier == tier)
    }

    pub fn count(&self, tier: Tier) -> usize {
        self.in_tier(tier).count()
    }
}
