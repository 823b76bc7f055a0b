pub mod rsi;
pub mod trend;

use thiserror::Error;

use crate::config::{Thresholds, RSI_PERIOD};
use crate::types::{IndicatorSet, PriceSeries};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("price series for {0} is empty")]
    DataInsufficient(String),
}

/// Compute the indicator set for one symbol. Short series leave the affected
/// indicators as None; only an empty series is an error.
pub fn compute(series: &PriceSeries, thresholds: &Thresholds) -> Result<IndicatorSet, IndicatorError> {
    let Some(last_close) = series.last_close() else {
        return Err(IndicatorError::DataInsufficient(series.symbol.clone()));
    };

    let closes = series.closes();
    let rsi = rsi::rsi(&closes, RSI_PERIOD);
    let trend = trend::trend_line(&closes, thresholds.trend_period, thresholds.trend_min_periods);
    let above_trend = trend.map(|t| trend::is_above(last_close, t));

    Ok(IndicatorSet { last_close, rsi, trend, above_trend })
}
