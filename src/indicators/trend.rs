//! Simple moving average trend line over the most recent closes.

/// Mean of the last `period` closes, or of every close when fewer than `period`
/// are available. None when the series has fewer than `min_periods` closes.
pub fn trend_line(closes: &[f64], period: usize, min_periods: usize) -> Option<f64> {
    if closes.is_empty() || closes.len() < min_periods.max(1) {
        return None;
    }
    let window = &closes[closes.len().saturating_sub(period)..];
    let mean = window.iter().sum::<f64>() / window.len() as f64;
    mean.is_finite().then_some(mean)
}

/// Strictly above: a close equal to the trend line is not a confirmation.
pub fn is_above(close: f64, trend: f64) -> bool {
    close > trend
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_only_the_most_recent_period() {
        let mut closes = vec![1000.0; 10];
        closes.extend((1..=200).map(|i| i as f64));
        let trend = trend_line(&closes, 200, 50).unwrap();
        assert!((trend - 100.5).abs() < 1e-9);
    }

    #[test]
    fn short_series_averages_everything_available() {
        let closes: Vec<f64> = (1..=60).map(|i| i as f64).collect();
        let trend = trend_line(&closes, 200, 50).unwrap();
        assert!((trend - 30.5).abs() < 1e-9);
    }

    #[test]
    fn below_minimum_is_inapplicable() {
        let closes = vec![10.0; 49];
        assert!(trend_line(&closes, 200, 50).is_none());
        assert!(trend_line(&[], 200, 50).is_none());
    }

    #[test]
    fn flat_series_at_minimum_is_not_above_trend() {
        let closes = vec![37.25; 50];
        let trend = trend_line(&closes, 200, 50).unwrap();
        assert_eq!(trend, 37.25);
        assert!(!is_above(*closes.last().unwrap(), trend));
    }
}
