//! Backtest orchestration: the bar-by-bar walk.
//!
//! One run is one synchronous linear pass over an immutable candle slice.
//! Per bar, in order: record equity, check risk exits on an open position
//! (stop-loss first, then take-profit, then exit conditions), then
//! evaluate entry conditions if flat. An open position at the final bar
//! is force-closed at the last close and flagged in the result.

use std::collections::HashMap;

use tracing::debug;

use super::candle::{validate_candles, Candle};
use super::error::BacktestError;
use super::evaluator::CompiledStrategy;
use super::indicator::{IndicatorKey, IndicatorSeries};
use super::metrics::{summarize, BacktestResult};
use super::position::{ExitReason, Side, Tracker};
use super::strategy::{ActionKind, AmountType, Strategy};

/// Minimum candle count for meaningful statistics.
pub const MIN_CANDLES: usize = 50;

/// Run-level parameters owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Starting capital; percentage-sized entries and the equity curve
    /// are based on this.
    pub initial_capital: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
        }
    }
}

/// Replay `candles` through `strategy` and aggregate the outcome.
pub fn run_backtest(
    candles: &[Candle],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, BacktestError> {
    if candles.len() < MIN_CANDLES {
        return Err(BacktestError::InsufficientData {
            bars: candles.len(),
            minimum: MIN_CANDLES,
        });
    }
    validate_candles(candles)?;
    let compiled = CompiledStrategy::compile(strategy)?;

    let series: HashMap<IndicatorKey, IndicatorSeries> = compiled
        .required_indicators()
        .into_iter()
        .map(|key| {
            let computed = key.calculate(candles);
            (key, computed)
        })
        .collect();

    let start = compiled.first_evaluable_bar(&series, candles.len());
    debug!(
        strategy = %strategy.name,
        bars = candles.len(),
        start_bar = start,
        "starting backtest walk"
    );

    let risk = &strategy.risk_management;
    let side = match compiled.entry_action.kind {
        ActionKind::Buy => Side::Long,
        ActionKind::Sell => Side::Short,
    };

    let mut tracker = Tracker::new();
    let mut equity_curve = Vec::with_capacity(candles.len().saturating_sub(start));

    for (i, candle) in candles.iter().enumerate().skip(start) {
        equity_curve
            .push(config.initial_capital + tracker.realized_pnl() + tracker.unrealized_pnl(candle.close));

        let open_position = tracker.position().cloned();

        if let Some(position) = &open_position {
            // Capital preservation first: stop-loss before take-profit
            // before signal exits.
            if let Some(stop) = position.stop_hit(candle.close, risk.stop_loss) {
                tracker.close(stop, candle.time, ExitReason::StopLoss);
            } else if let Some(target) = position.target_hit(candle.close, risk.take_profit) {
                tracker.close(target, candle.time, ExitReason::TakeProfit);
            } else if compiled.exit_signal(candles, &series, i) {
                tracker.close(candle.close, candle.time, ExitReason::Signal);
            }
        }

        // A bar that closed a position does not also open one; entries
        // only fire on bars that started flat.
        if open_position.is_none()
            && compiled.entry_signal(candles, &series, i)
            && tracker.can_enter(candle.day(), risk.max_daily_trades)
        {
            let quantity = entry_quantity(&compiled, candle.close, config, risk.max_position_size);
            if quantity > 0.0 {
                tracker.open(side, candle.close, candle.time, quantity);
            }
        }
    }

    // Unclosed position at the last bar: liquidate at the final close for
    // statistics purposes.
    let liquidated_at_end = if tracker.is_open() {
        let last = &candles[candles.len() - 1];
        tracker.close(last.close, last.time, ExitReason::EndOfData);
        true
    } else {
        false
    };

    let result = summarize(
        tracker.into_trades(),
        &equity_curve,
        config.initial_capital,
        &strategy.timeframe,
        liquidated_at_end,
    );
    debug!(
        total_trades = result.total_trades,
        total_pnl = result.total_pnl,
        win_rate = result.win_rate,
        "backtest complete"
    );
    Ok(result)
}

/// Quantity for the entry action at the current close: fixed currency
/// amount or percentage of starting capital, capped by
/// `max_position_size` when non-zero.
fn entry_quantity(
    compiled: &CompiledStrategy,
    close: f64,
    config: &BacktestConfig,
    max_position_size: f64,
) -> f64 {
    if close <= 0.0 {
        return 0.0;
    }
    let action = &compiled.entry_action;
    let notional = match action.amount_type {
        AmountType::Fixed => action.amount,
        AmountType::Percentage => config.initial_capital * action.amount / 100.0,
    };
    let mut quantity = notional / close;
    if max_position_size > 0.0 && quantity > max_position_size {
        quantity = max_position_size;
    }
    quantity
}
