//! Technical indicator series.
//!
//! - `IndicatorPoint`: one point in an indicator time series
//! - `IndicatorValue`: enum over indicator output shapes
//! - `IndicatorKey`: indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: a series aligned 1:1 with the candle series
//!
//! Every calculator returns a series of the same length as its candle
//! input, with `valid: false` points over the warm-up window. Calculators
//! are pure and deterministic: identical input produces bit-for-bit
//! identical output on every invocation.

pub mod ema;
pub mod macd;
pub mod rsi;

pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;

use std::fmt;

use super::candle::Candle;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_EMA_PERIOD: usize = 20;
pub const DEFAULT_MACD_FAST: usize = 12;
pub const DEFAULT_MACD_SLOW: usize = 26;
pub const DEFAULT_MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub time: i64,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKey {
    Rsi(usize),
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub key: IndicatorKey,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Index of the first valid point, if any.
    pub fn first_valid(&self) -> Option<usize> {
        self.values.iter().position(|p| p.valid)
    }
}

impl IndicatorKey {
    /// Compute this indicator over the candle series.
    pub fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        match *self {
            IndicatorKey::Rsi(period) => calculate_rsi(candles, period),
            IndicatorKey::Ema(period) => calculate_ema(candles, period),
            IndicatorKey::Macd { fast, slow, signal } => {
                calculate_macd(candles, fast, slow, signal)
            }
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKey::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKey::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKey::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}
