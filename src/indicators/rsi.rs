//! Relative Strength Index with Wilder smoothing.
//!
//! Seed: simple mean of the first `period` gains and losses.
//! Then `avg = (avg * (period - 1) + current) / period` for each later change.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; no movement at all → 50.

/// Latest RSI value, or None when fewer than `period + 1` closes are available
/// or any close is not finite.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    if closes.iter().any(|c| !c.is_finite()) {
        return None;
    }

    let mut changes = closes.windows(2).map(|w| w[1] - w[0]);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for change in changes.by_ref().take(period) {
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    let weight = (period - 1) as f64;
    for change in changes {
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        avg_gain = (avg_gain * weight + gain) / period as f64;
        avg_loss = (avg_loss * weight + loss) / period as f64;
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        (100.0 - 100.0 / (1.0 + avg_gain / avg_loss)).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: usize = 14;

    fn assert_approx(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    /// Mirror every change around the first close.
    fn reversed(closes: &[f64]) -> Vec<f64> {
        let base = closes[0];
        closes.iter().map(|c| 2.0 * base - c).collect()
    }

    fn wavy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.05)
            .collect()
    }

    #[test]
    fn needs_period_plus_one_closes() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&closes, PERIOD).is_none());

        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert!(rsi(&closes, PERIOD).is_some());
    }

    #[test]
    fn strictly_increasing_is_100() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64 * 0.5).collect();
        assert_approx(rsi(&closes, PERIOD).unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn strictly_decreasing_is_0() {
        let closes: Vec<f64> = (0..40).map(|i| 90.0 - i as f64).collect();
        assert_approx(rsi(&closes, PERIOD).unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn flat_series_is_neutral() {
        let closes = vec![42.0; 30];
        assert_approx(rsi(&closes, PERIOD).unwrap(), 50.0, 1e-9);
    }

    #[test]
    fn stays_within_bounds() {
        for n in [15, 16, 30, 100, 260] {
            let value = rsi(&wavy(n), PERIOD).unwrap();
            assert!((0.0..=100.0).contains(&value), "n={n} rsi={value}");
        }
    }

    #[test]
    fn reversing_changes_mirrors_rsi() {
        let closes = wavy(120);
        let up = rsi(&closes, PERIOD).unwrap();
        let down = rsi(&reversed(&closes), PERIOD).unwrap();
        assert_approx(up + down, 100.0, 1e-9);
    }

    #[test]
    fn seed_only_matches_simple_averages() {
        // 15 closes → exactly 14 changes, no smoothing step.
        // Gains: 7 × 1.0, losses: 7 × 0.5 → RS = 2 → RSI = 66.67
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 0.5 });
        }
        assert_approx(rsi(&closes, PERIOD).unwrap(), 100.0 - 100.0 / 3.0, 1e-9);
    }

    #[test]
    fn smoothing_step_uses_wilder_recurrence() {
        // Seed as above (avg_gain 0.5, avg_loss 0.25), then one +1.0 change:
        // avg_gain = (0.5 * 13 + 1.0) / 14, avg_loss = 0.25 * 13 / 14
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 0.5 });
        }
        let last = *closes.last().unwrap();
        closes.push(last + 1.0);

        let avg_gain = (0.5 * 13.0 + 1.0) / 14.0;
        let avg_loss = 0.25 * 13.0 / 14.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert_approx(rsi(&closes, PERIOD).unwrap(), expected, 1e-9);
    }

    #[test]
    fn non_finite_close_is_inapplicable() {
        let mut closes = wavy(30);
        closes[10] = f64::NAN;
        assert!(rsi(&closes, PERIOD).is_none());
    }
}
