//! Aggregate performance statistics.
//!
//! Computed once at the end of a run from the final trade ledger and the
//! equity curve built during the walk. Numeric edge cases (no trades,
//! zero return variance, empty curve) resolve to defined values so the
//! result never carries NaN or infinity.

use serde::{Deserialize, Serialize};

use super::position::Trade;

const HOURS_PER_YEAR: f64 = 365.0 * 24.0;
const MINUTES_PER_YEAR: f64 = HOURS_PER_YEAR * 60.0;
const DAYS_PER_YEAR: f64 = 365.0;
const WEEKS_PER_YEAR: f64 = 52.0;

/// Aggregate result of one backtest run; the wire contract with the
/// presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percent in [0, 100]; exactly 0 when there are no trades.
    pub win_rate: f64,
    pub total_pnl: f64,
    /// Largest peak-to-trough equity decline, percent.
    pub max_drawdown: f64,
    /// Annualized mean/stdev of bar-over-bar equity returns; 0 when the
    /// return variance is zero.
    pub sharpe_ratio: f64,
    pub trades: Vec<Trade>,
    /// True when an open position was force-closed at the last candle.
    pub liquidated_at_end: bool,
    pub final_equity: f64,
    /// Total pnl relative to the configured starting capital, percent.
    pub total_return_pct: f64,
}

/// Build a [`BacktestResult`] from the ledger and equity curve.
pub fn summarize(
    trades: Vec<Trade>,
    equity_curve: &[f64],
    initial_capital: f64,
    timeframe: &str,
    liquidated_at_end: bool,
) -> BacktestResult {
    let total_trades = trades.len();
    let winning_trades = trades.iter().filter(|t| t.pnl > 0.0).count();
    let losing_trades = total_trades - winning_trades;

    let win_rate = if total_trades > 0 {
        winning_trades as f64 / total_trades as f64 * 100.0
    } else {
        0.0
    };

    let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();

    let final_equity = equity_curve.last().copied().unwrap_or(initial_capital);
    let total_return_pct = if initial_capital > 0.0 {
        total_pnl / initial_capital * 100.0
    } else {
        0.0
    };

    BacktestResult {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate,
        total_pnl,
        max_drawdown: max_drawdown_pct(equity_curve),
        sharpe_ratio: sharpe_ratio(equity_curve, bars_per_year(timeframe)),
        trades,
        liquidated_at_end,
        final_equity,
        total_return_pct,
    }
}

/// Largest percentage decline from a running equity peak.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &equity in equity_curve {
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}

/// Annualized Sharpe ratio of bar-over-bar equity returns. Zero when
/// there are fewer than two points or the return stdev is zero.
pub fn sharpe_ratio(equity_curve: &[f64], bars_per_year: f64) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * bars_per_year.sqrt()
    } else {
        0.0
    }
}

/// Bars per year for a timeframe string like "1m", "15m", "1h", "4h",
/// "1d", "1w" (365-day year). Unknown timeframes fall back to daily.
pub fn bars_per_year(timeframe: &str) -> f64 {
    let canonical = timeframe.trim().to_ascii_lowercase();
    let Some(unit) = canonical.chars().last() else {
        return DAYS_PER_YEAR;
    };
    let count: f64 = match canonical[..canonical.len() - unit.len_utf8()].parse::<u32>() {
        Ok(n) if n > 0 => n as f64,
        _ => return DAYS_PER_YEAR,
    };

    match unit {
        'm' => MINUTES_PER_YEAR / count,
        'h' => HOURS_PER_YEAR / count,
        'd' => DAYS_PER_YEAR / count,
        'w' => WEEKS_PER_YEAR / count,
        _ => DAYS_PER_YEAR,
    }
}
