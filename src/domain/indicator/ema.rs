//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed at index n-1 with the SMA of the first n closes,
//! then EMA[i] = C[i]*k + EMA[i-1]*(1-k). Warmup: first n-1 bars invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorKey, IndicatorPoint, IndicatorSeries, IndicatorValue};

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.len() < period {
        return IndicatorSeries {
            key: IndicatorKey::Ema(period),
            values: candles
                .iter()
                .map(|c| IndicatorPoint {
                    time: c.time,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                })
                .collect(),
        };
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(candles.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        if i < period - 1 {
            sum += candle.close;
            values.push(IndicatorPoint {
                time: candle.time,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
        } else if i == period - 1 {
            sum += candle.close;
            ema = sum / period as f64;
            values.push(IndicatorPoint {
                time: candle.time,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        } else {
            ema = candle.close * k + ema * (1.0 - k);
            values.push(IndicatorPoint {
                time: candle.time,
                valid: true,
                value: IndicatorValue::Simple(ema),
            });
        }
    }

    IndicatorSeries {
        key: IndicatorKey::Ema(period),
        values,
    }
}
