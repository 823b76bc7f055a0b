use tracing::debug;

use crate::config::Thresholds;
use crate::scorer::criteria::{standard_criteria, Criterion};
use crate::types::{
    CriterionResult, Fundamentals, InapplicableReason, IndicatorSet, Outcome, Score, ScoreRecord,
};

/// Runs an ordered rule set against one symbol. Stateless between symbols.
pub struct CriteriaEvaluator {
    criteria: Vec<Box<dyn Criterion>>,
}

impl CriteriaEvaluator {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self::with_criteria(standard_criteria(thresholds))
    }

    pub fn with_criteria(criteria: Vec<Box<dyn Criterion>>) -> Self {
        Self { criteria }
    }

    pub fn evaluate(&self, indicators: &IndicatorSet, fundamentals: &Fundamentals) -> ScoreRecord {
        let sector = fundamentals.sector.as_deref();

        let results: Vec<CriterionResult> = self
            .criteria
            .iter()
            .map(|criterion| {
                let outcome = if criterion.is_exempt(sector) {
                    Outcome::Inapplicable(InapplicableReason::SectorExempt)
                } else {
                    match criterion.evaluate(indicators, fundamentals) {
                        Some(true) => Outcome::Passed,
                        Some(false) => Outcome::Failed,
                        None => Outcome::Inapplicable(InapplicableReason::MissingData),
                    }
                };
                debug!(criterion = %criterion.kind(), ?outcome, "criterion evaluated");
                CriterionResult { criterion: criterion.kind(), outcome }
            })
            .collect();

        let applicable = results.iter().filter(|r| r.is_applicable()).count() as u32;
        let passed = results.iter().filter(|r| r.is_passed()).count() as u32;

        ScoreRecord { applicable, passed, score: compute_score(applicable, passed), results }
    }
}

/// Percentage of applicable criteria passed. Zero applicable criteria yields
/// `Score::Vacuous` instead of a number.
fn compute_score(applicable: u32, passed: u32) -> Score {
    if applicable == 0 {
        Score::Vacuous
    } else {
        Score::Percent(passed as f64 / applicable as f64 * 100.0)
    }
}
