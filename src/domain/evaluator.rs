//! Strategy condition compilation and per-bar evaluation.
//!
//! Compilation happens once at the boundary: indicator names are
//! canonicalized (trim + lower-case) and resolved to typed
//! [`IndicatorKey`]s, so a misspelled indicator surfaces as
//! `InvalidStrategy` instead of a silently-false condition.
//!
//! # Evaluation semantics
//!
//! - All conditions in a list are AND-combined.
//! - `less_than` / `greater_than`: strict comparison at the current bar
//! - `equals`: within epsilon 1e-9
//! - `crosses_above` / `crosses_below`: two-bar test against the
//!   condition value; false when no previous bar exists
//! - A condition whose indicator value is invalid at the inspected bar
//!   evaluates false, never true.

use std::collections::HashMap;

use tracing::debug;

use super::candle::Candle;
use super::error::BacktestError;
use super::indicator::{
    IndicatorKey, IndicatorSeries, IndicatorValue, DEFAULT_EMA_PERIOD, DEFAULT_MACD_FAST,
    DEFAULT_MACD_SIGNAL, DEFAULT_MACD_SLOW, DEFAULT_RSI_PERIOD,
};
use super::strategy::{Action, Condition, ConditionKind, Operator, Strategy};

const EPSILON: f64 = 1e-9;

/// A strategy with every condition resolved to a typed target.
#[derive(Debug, Clone)]
pub struct CompiledStrategy {
    pub entry: Vec<CompiledCondition>,
    pub exit: Vec<CompiledCondition>,
    pub entry_action: Action,
}

#[derive(Debug, Clone)]
pub struct CompiledCondition {
    pub operator: Operator,
    pub value: f64,
    pub target: ConditionTarget,
}

/// What a condition compares against the threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionTarget {
    Indicator {
        key: IndicatorKey,
        field: IndicatorField,
    },
    /// Bar close price.
    Price,
    /// Bar UTC hour of day (0-23).
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorField {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
}

impl CompiledStrategy {
    /// Resolve and validate a strategy once, before the walk.
    pub fn compile(strategy: &Strategy) -> Result<Self, BacktestError> {
        if strategy.conditions.is_empty() {
            return Err(BacktestError::invalid_strategy(
                "strategy has no entry conditions",
            ));
        }

        // The first entry action sizes the position; extras are ignored.
        let entry_action = strategy
            .entry_actions
            .first()
            .cloned()
            .ok_or_else(|| BacktestError::invalid_strategy("strategy has no entry action"))?;

        if entry_action.amount <= 0.0 {
            return Err(BacktestError::invalid_strategy(
                "entry action amount must be positive",
            ));
        }

        let entry = strategy
            .conditions
            .iter()
            .map(compile_condition)
            .collect::<Result<Vec<_>, _>>()?;
        let exit = strategy
            .exit_conditions
            .iter()
            .map(compile_condition)
            .collect::<Result<Vec<_>, _>>()?;

        let compiled = CompiledStrategy {
            entry,
            exit,
            entry_action,
        };
        debug!(
            strategy = %strategy.name,
            entry_conditions = compiled.entry.len(),
            exit_conditions = compiled.exit.len(),
            indicators = ?compiled.required_indicators(),
            "compiled strategy"
        );
        Ok(compiled)
    }

    /// Distinct indicators the strategy needs computed.
    pub fn required_indicators(&self) -> Vec<IndicatorKey> {
        let mut keys: Vec<IndicatorKey> = Vec::new();
        for cond in self.entry.iter().chain(self.exit.iter()) {
            if let ConditionTarget::Indicator { key, .. } = &cond.target {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// First bar index at which every condition can be evaluated: all
    /// indicator series past warm-up, plus one extra bar for crossings.
    pub fn first_evaluable_bar(
        &self,
        series: &HashMap<IndicatorKey, IndicatorSeries>,
        len: usize,
    ) -> usize {
        let mut start = 0usize;
        for cond in self.entry.iter().chain(self.exit.iter()) {
            let mut first = match &cond.target {
                ConditionTarget::Indicator { key, .. } => series
                    .get(key)
                    .and_then(|s| s.first_valid())
                    .unwrap_or(len),
                ConditionTarget::Price | ConditionTarget::Time => 0,
            };
            if cond.operator.is_crossing() {
                first = first.saturating_add(1);
            }
            start = start.max(first);
        }
        start.min(len)
    }

    /// True when every entry condition holds at `bar_index`.
    pub fn entry_signal(
        &self,
        candles: &[Candle],
        series: &HashMap<IndicatorKey, IndicatorSeries>,
        bar_index: usize,
    ) -> bool {
        self.entry
            .iter()
            .all(|c| condition_holds(c, candles, series, bar_index))
    }

    /// True when the strategy has exit conditions and all of them hold.
    pub fn exit_signal(
        &self,
        candles: &[Candle],
        series: &HashMap<IndicatorKey, IndicatorSeries>,
        bar_index: usize,
    ) -> bool {
        !self.exit.is_empty()
            && self
                .exit
                .iter()
                .all(|c| condition_holds(c, candles, series, bar_index))
    }
}

fn compile_condition(condition: &Condition) -> Result<CompiledCondition, BacktestError> {
    let target = match condition.kind {
        ConditionKind::Price => ConditionTarget::Price,
        ConditionKind::Time => ConditionTarget::Time,
        ConditionKind::Indicator => {
            let name = condition.indicator.as_deref().ok_or_else(|| {
                BacktestError::invalid_strategy(format!(
                    "condition '{}' has no indicator name",
                    condition.id
                ))
            })?;
            let key = parse_indicator_name(name)?;
            let field = parse_field(&key, condition.parameter.as_deref())?;
            ConditionTarget::Indicator { key, field }
        }
    };

    Ok(CompiledCondition {
        operator: condition.operator,
        value: condition.value,
        target,
    })
}

/// Canonicalize and resolve an indicator name: "rsi", "ema_50", "macd".
/// An optional `_<period>` suffix overrides the default period.
fn parse_indicator_name(raw: &str) -> Result<IndicatorKey, BacktestError> {
    let canonical = raw.trim().to_ascii_lowercase();
    let (base, period) = match canonical.split_once('_') {
        Some((base, suffix)) => {
            let period = suffix.parse::<usize>().map_err(|_| {
                BacktestError::invalid_strategy(format!("bad indicator period in '{raw}'"))
            })?;
            if period == 0 {
                return Err(BacktestError::invalid_strategy(format!(
                    "indicator period must be positive in '{raw}'"
                )));
            }
            (base, Some(period))
        }
        None => (canonical.as_str(), None),
    };

    match base {
        "rsi" => Ok(IndicatorKey::Rsi(period.unwrap_or(DEFAULT_RSI_PERIOD))),
        "ema" => Ok(IndicatorKey::Ema(period.unwrap_or(DEFAULT_EMA_PERIOD))),
        "macd" => {
            if period.is_some() {
                return Err(BacktestError::invalid_strategy(format!(
                    "macd does not take a period suffix: '{raw}'"
                )));
            }
            Ok(IndicatorKey::Macd {
                fast: DEFAULT_MACD_FAST,
                slow: DEFAULT_MACD_SLOW,
                signal: DEFAULT_MACD_SIGNAL,
            })
        }
        _ => Err(BacktestError::invalid_strategy(format!(
            "unknown indicator '{raw}'"
        ))),
    }
}

fn parse_field(
    key: &IndicatorKey,
    parameter: Option<&str>,
) -> Result<IndicatorField, BacktestError> {
    let canonical = parameter.map(|p| p.trim().to_ascii_lowercase());
    match key {
        IndicatorKey::Macd { .. } => match canonical.as_deref() {
            None | Some("") | Some("line") | Some("value") => Ok(IndicatorField::MacdLine),
            Some("signal") => Ok(IndicatorField::MacdSignal),
            Some("histogram") => Ok(IndicatorField::MacdHistogram),
            Some(other) => Err(BacktestError::invalid_strategy(format!(
                "unknown macd field '{other}'"
            ))),
        },
        IndicatorKey::Rsi(_) | IndicatorKey::Ema(_) => match canonical.as_deref() {
            None | Some("") | Some("value") => Ok(IndicatorField::Value),
            Some(other) => Err(BacktestError::invalid_strategy(format!(
                "unknown field '{other}' for {key}"
            ))),
        },
    }
}

fn condition_holds(
    condition: &CompiledCondition,
    candles: &[Candle],
    series: &HashMap<IndicatorKey, IndicatorSeries>,
    bar_index: usize,
) -> bool {
    let current = resolve_target(&condition.target, candles, series, bar_index);
    match condition.operator {
        Operator::LessThan => current < condition.value,
        Operator::GreaterThan => current > condition.value,
        Operator::Equals => (current - condition.value).abs() < EPSILON,
        Operator::CrossesAbove => {
            if bar_index == 0 {
                return false;
            }
            let previous = resolve_target(&condition.target, candles, series, bar_index - 1);
            previous <= condition.value && current > condition.value
        }
        Operator::CrossesBelow => {
            if bar_index == 0 {
                return false;
            }
            let previous = resolve_target(&condition.target, candles, series, bar_index - 1);
            previous >= condition.value && current < condition.value
        }
    }
}

/// NaN when the indicator is missing or still warming up; every comparison
/// against NaN is false, so such a condition can never fire.
fn resolve_target(
    target: &ConditionTarget,
    candles: &[Candle],
    series: &HashMap<IndicatorKey, IndicatorSeries>,
    bar_index: usize,
) -> f64 {
    match target {
        ConditionTarget::Price => candles[bar_index].close,
        ConditionTarget::Time => candles[bar_index].hour() as f64,
        ConditionTarget::Indicator { key, field } => {
            let Some(s) = series.get(key) else {
                return f64::NAN;
            };
            let Some(point) = s.values.get(bar_index) else {
                return f64::NAN;
            };
            if !point.valid {
                return f64::NAN;
            }
            match (&point.value, field) {
                (IndicatorValue::Simple(v), IndicatorField::Value) => *v,
                (IndicatorValue::Macd { line, .. }, IndicatorField::MacdLine) => *line,
                (IndicatorValue::Macd { signal, .. }, IndicatorField::MacdSignal) => *signal,
                (IndicatorValue::Macd { histogram, .. }, IndicatorField::MacdHistogram) => {
                    *histogram
                }
                _ => f64::NAN,
            }
        }
    }
}
