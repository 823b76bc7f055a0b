//! Compare the current scan with the previous one.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::models::ScanResultRow;
use crate::types::{ScanReport, Tier};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanDiff {
    /// Signals now that were not signals last time.
    pub new_signals: Vec<String>,
    /// Signals last time that are no longer signals.
    pub dropped_signals: Vec<String>,
    /// Near-misses now that were neither signals nor near-misses last time.
    pub new_near_misses: Vec<String>,
    /// Symbols present in both scans whose tier changed.
    pub tier_changes: usize,
}

impl ScanDiff {
    pub fn is_empty(&self) -> bool {
        self.new_signals.is_empty()
            && self.dropped_signals.is_empty()
            && self.new_near_misses.is_empty()
            && self.tier_changes == 0
    }
}

/// Diff two scans given as (symbol, tier) pairs. Output lists are sorted.
pub fn diff_tiers<'a, P, C>(previous: P, current: C) -> ScanDiff
where
    P: IntoIterator<Item = (&'a str, Tier)>,
    C: IntoIterator<Item = (&'a str, Tier)>,
{
    let before: HashMap<&str, Tier> = previous.into_iter().collect();
    let after: HashMap<&str, Tier> = current.into_iter().collect();

    let mut diff = ScanDiff::default();

    for (&symbol, &tier) in &after {
        let prior = before.get(symbol).copied();
        match tier {
            Tier::Signal if prior != Some(Tier::Signal) => diff.new_signals.push(symbol.to_string()),
            Tier::NearMiss if !matches!(prior, Some(Tier::Signal | Tier::NearMiss)) => {
                diff.new_near_misses.push(symbol.to_string())
            }
            _ => {}
        }
        if prior.is_some_and(|p| p != tier) {
            diff.tier_changes += 1;
        }
    }

    diff.dropped_signals = before
        .iter()
        .filter(|(symbol, tier)| **tier == Tier::Signal && after.get(*symbol) != Some(&Tier::Signal))
        .map(|(symbol, _)| symbol.to_string())
        .collect();

    diff.new_signals.sort();
    diff.dropped_signals.sort();
    diff.new_near_misses.sort();
    diff
}

/// Diff the stored previous scan against a fresh report. Rows with an
/// unrecognised tier label are ignored.
pub fn diff_scans(previous: &[ScanResultRow], current: &ScanReport) -> ScanDiff {
    diff_tiers(
        previous
            .iter()
            .filter_map(|row| row.tier().map(|t| (row.symbol.as_str(), t))),
        current.symbols.iter().map(|s| (s.symbol.as_str(), s.tier)),
    )
}
