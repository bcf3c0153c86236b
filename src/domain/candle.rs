//! OHLCV candle representation and series validation.
//!
//! Candles are validated once at ingestion, never per bar. A series that
//! violates the OHLC invariants or timestamp ordering is rejected with
//! `InvalidCandleSequence` before any backtest work starts.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time, epoch seconds (UTC).
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// UTC calendar day of the bar, for daily trade limits.
    pub fn day(&self) -> NaiveDate {
        DateTime::from_timestamp(self.time, 0)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }

    /// UTC hour of day (0-23), used by time conditions.
    pub fn hour(&self) -> u32 {
        use chrono::Timelike;
        DateTime::from_timestamp(self.time, 0)
            .map(|dt| dt.hour())
            .unwrap_or(0)
    }

    fn check(&self) -> Result<(), String> {
        for (name, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ] {
            if !value.is_finite() {
                return Err(format!("non-finite {name}"));
            }
        }
        if self.volume < 0.0 {
            return Err("negative volume".into());
        }
        if self.high < self.open.max(self.close) {
            return Err("high below max(open, close)".into());
        }
        if self.low > self.open.min(self.close) {
            return Err("low above min(open, close)".into());
        }
        Ok(())
    }
}

/// Validate a candle series: per-bar OHLC invariants plus strictly
/// increasing timestamps across the series.
pub fn validate_candles(candles: &[Candle]) -> Result<(), BacktestError> {
    for (i, candle) in candles.iter().enumerate() {
        candle
            .check()
            .map_err(|reason| BacktestError::InvalidCandleSequence { index: i, reason })?;

        if i > 0 && candle.time <= candles[i - 1].time {
            return Err(BacktestError::InvalidCandleSequence {
                index: i,
                reason: "non-increasing timestamp".into(),
            });
        }
    }
    Ok(())
}
