use crate::config::Thresholds;
use crate::types::{CriterionKind, Fundamentals, IndicatorSet};

/// One named screening rule.
///
/// The evaluator asks, in order: is the sector exempt, then what does the rule
/// say. `evaluate` returns None when a required input is absent so a missing
/// value never counts as a pass or a fail.
pub trait Criterion: Send + Sync {
    fn kind(&self) -> CriterionKind;

    fn is_exempt(&self, _sector: Option<&str>) -> bool {
        false
    }

    fn evaluate(&self, indicators: &IndicatorSet, fundamentals: &Fundamentals) -> Option<bool>;
}

/// Case-insensitive sector membership. An unknown sector is never exempt.
fn sector_in(sector: Option<&str>, set: &[String]) -> bool {
    match sector.map(str::trim) {
        Some(s) if !s.is_empty() => set.iter().any(|e| e.trim().eq_ignore_ascii_case(s)),
        _ => false,
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

pub struct RsiOversold {
    pub threshold: f64,
}

impl Criterion for RsiOversold {
    fn kind(&self) -> CriterionKind {
        CriterionKind::RsiOversold
    }

    fn evaluate(&self, indicators: &IndicatorSet, _: &Fundamentals) -> Option<bool> {
        indicators.rsi.map(|rsi| rsi < self.threshold)
    }
}

pub struct TrendConfirmation;

impl Criterion for TrendConfirmation {
    fn kind(&self) -> CriterionKind {
        CriterionKind::TrendConfirmation
    }

    fn evaluate(&self, indicators: &IndicatorSet, _: &Fundamentals) -> Option<bool> {
        indicators.above_trend
    }
}

/// Trailing P/E below the cap. Zero or negative earnings make the ratio
/// meaningless, so the criterion does not apply.
pub struct Valuation {
    pub max_pe: f64,
}

impl Criterion for Valuation {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Valuation
    }

    fn evaluate(&self, _: &IndicatorSet, fundamentals: &Fundamentals) -> Option<bool> {
        finite(fundamentals.trailing_pe)
            .filter(|pe| *pe > 0.0)
            .map(|pe| pe < self.max_pe)
    }
}

pub struct PriceToBook {
    pub max_pb: f64,
    pub exempt_sectors: Vec<String>,
}

impl Criterion for PriceToBook {
    fn kind(&self) -> CriterionKind {
        CriterionKind::PriceToBook
    }

    fn is_exempt(&self, sector: Option<&str>) -> bool {
        sector_in(sector, &self.exempt_sectors)
    }

    fn evaluate(&self, _: &IndicatorSet, fundamentals: &Fundamentals) -> Option<bool> {
        finite(fundamentals.price_to_book).map(|pb| pb < self.max_pb)
    }
}

/// ROE above its floor OR revenue growth above its floor. Counts once;
/// inapplicable only when both inputs are absent.
pub struct QualityOrGrowth {
    pub min_roe: f64,
    pub min_revenue_growth: f64,
}

impl Criterion for QualityOrGrowth {
    fn kind(&self) -> CriterionKind {
        CriterionKind::QualityOrGrowth
    }

    fn evaluate(&self, _: &IndicatorSet, fundamentals: &Fundamentals) -> Option<bool> {
        let roe = finite(fundamentals.return_on_equity);
        let growth = finite(fundamentals.revenue_growth);
        if roe.is_none() && growth.is_none() {
            return None;
        }
        let quality = roe.is_some_and(|r| r > self.min_roe);
        let growing = growth.is_some_and(|g| g > self.min_revenue_growth);
        Some(quality || growing)
    }
}

pub struct Leverage {
    pub max_debt_to_equity: f64,
    pub exempt_sectors: Vec<String>,
}

impl Criterion for Leverage {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Leverage
    }

    fn is_exempt(&self, sector: Option<&str>) -> bool {
        sector_in(sector, &self.exempt_sectors)
    }

    fn evaluate(&self, _: &IndicatorSet, fundamentals: &Fundamentals) -> Option<bool> {
        finite(fundamentals.debt_to_equity).map(|de| de < self.max_debt_to_equity)
    }
}

/// The fixed, ordered rule set.
pub fn standard_criteria(t: &Thresholds) -> Vec<Box<dyn Criterion>> {
    vec![
        Box::new(RsiOversold { threshold: t.rsi_oversold }),
        Box::new(TrendConfirmation),
        Box::new(Valuation { max_pe: t.max_pe }),
        Box::new(PriceToBook {
            max_pb: t.max_pb,
            exempt_sectors: t.pb_exempt_sectors.clone(),
        }),
        Box::new(QualityOrGrowth {
            min_roe: t.min_roe,
            min_revenue_growth: t.min_revenue_growth,
        }),
        Box::new(Leverage {
            max_debt_to_equity: t.max_debt_to_equity,
            exempt_sectors: t.de_exempt_sectors.clone(),
        }),
    ]
}
