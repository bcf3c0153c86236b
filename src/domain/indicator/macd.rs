//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of the MACD line
//! Histogram = MACD Line - Signal Line
//!
//! The signal EMA is seeded only from bars where the MACD line is itself
//! valid (i >= slow - 1), so the warm-up zeros of the nested EMAs never
//! leak into the signal. Valid from index slow - 1 + signal - 1.

use crate::domain::candle::Candle;
use crate::domain::indicator::{
    calculate_ema, IndicatorKey, IndicatorPoint, IndicatorSeries, IndicatorValue,
};

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let key = IndicatorKey::Macd {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            key,
            values: candles
                .iter()
                .map(|c| IndicatorPoint {
                    time: c.time,
                    valid: false,
                    value: IndicatorValue::Macd {
                        line: 0.0,
                        signal: 0.0,
                        histogram: 0.0,
                    },
                })
                .collect(),
        };
    }

    let ema_fast = ema_raw_values(candles, fast);
    let ema_slow = ema_raw_values(candles, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(ema_slow.iter())
        .map(|(f, s)| f - s)
        .collect();

    // Signal EMA over the MACD line, skipping the line's warm-up window.
    let k = 2.0 / (signal_period as f64 + 1.0);
    let macd_warmup = slow - 1;
    let mut signal_line = vec![0.0; candles.len()];

    if macd_warmup + signal_period <= candles.len() {
        let seed: f64 = macd_line[macd_warmup..macd_warmup + signal_period]
            .iter()
            .sum::<f64>()
            / signal_period as f64;
        let mut signal_ema = seed;
        signal_line[macd_warmup + signal_period - 1] = signal_ema;

        for i in (macd_warmup + signal_period)..candles.len() {
            signal_ema = macd_line[i] * k + signal_ema * (1.0 - k);
            signal_line[i] = signal_ema;
        }
    }

    let warmup = slow - 1 + signal_period - 1;
    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let line = macd_line[i];
            let signal = signal_line[i];
            IndicatorPoint {
                time: candle.time,
                valid: i >= warmup,
                value: IndicatorValue::Macd {
                    line,
                    signal,
                    histogram: line - signal,
                },
            }
        })
        .collect();

    IndicatorSeries { key, values }
}

/// Raw f64 values from the EMA calculator, 0.0 over its warm-up.
fn ema_raw_values(candles: &[Candle], period: usize) -> Vec<f64> {
    calculate_ema(candles, period)
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Simple(v) => v,
            _ => 0.0,
        })
        .collect()
}
