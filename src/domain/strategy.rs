//! Strategy configuration value objects.
//!
//! These are the wire contract with the caller (serde snake_case field
//! names). A strategy is supplied once per backtest run and never mutated
//! by the engine. Condition and action kinds are tagged enums so every
//! branch is checked at compile time; the free-form `indicator` string is
//! resolved to a typed reference by the evaluator at the boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub name: String,
    pub symbol: String,
    /// Bar interval the candles were sampled at, e.g. "1m", "1h", "1d".
    /// Drives the Sharpe annualization factor.
    pub timeframe: String,
    /// Entry conditions, AND-combined: one unsatisfied condition blocks
    /// entry.
    pub conditions: Vec<Condition>,
    /// Exit conditions, AND-combined; empty means exits happen only via
    /// stop-loss, take-profit, or end-of-data liquidation.
    #[serde(default)]
    pub exit_conditions: Vec<Condition>,
    pub entry_actions: Vec<Action>,
    #[serde(default)]
    pub exit_actions: Vec<Action>,
    pub risk_management: RiskConfig,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub operator: Operator,
    pub value: f64,
    /// Indicator name for `kind == Indicator`, matched case-insensitively
    /// ("rsi", "ema_50", "macd", ...).
    #[serde(default)]
    pub indicator: Option<String>,
    /// Output field of a multi-value indicator ("line", "signal",
    /// "histogram" for MACD).
    #[serde(default)]
    pub parameter: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Indicator,
    Price,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    LessThan,
    GreaterThan,
    Equals,
    CrossesAbove,
    CrossesBelow,
}

impl Operator {
    /// Crossing operators need the previous bar as well as the current.
    pub fn is_crossing(self) -> bool {
        matches!(self, Operator::CrossesAbove | Operator::CrossesBelow)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub amount: f64,
    pub amount_type: AmountType,
    pub order_type: OrderType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountType {
    /// Currency amount, converted to quantity at the current close.
    Fixed,
    /// Percentage of the configured starting capital.
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
}

/// Risk management limits. A value of zero disables the corresponding
/// limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Stop-loss distance from entry, percent.
    #[serde(default)]
    pub stop_loss: f64,
    /// Take-profit distance from entry, percent.
    #[serde(default)]
    pub take_profit: f64,
    /// Cap on position quantity.
    #[serde(default)]
    pub max_position_size: f64,
    /// Cap on entries per UTC calendar day.
    #[serde(default)]
    pub max_daily_trades: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_deserializes_from_wire_json() {
        let json = r#"{
            "id": "s1",
            "name": "RSI dip buyer",
            "symbol": "BTCUSDT",
            "timeframe": "1h",
            "conditions": [{
                "id": "c1",
                "type": "indicator",
                "operator": "less_than",
                "value": 30.0,
                "indicator": "RSI"
            }],
            "entry_actions": [{
                "id": "a1",
                "type": "buy",
                "amount": 100.0,
                "amount_type": "fixed",
                "order_type": "market"
            }],
            "risk_management": {
                "stop_loss": 5.0,
                "take_profit": 10.0,
                "max_position_size": 0.0,
                "max_daily_trades": 3
            }
        }"#;

        let strategy: Strategy = serde_json::from_str(json).unwrap();
        assert_eq!(strategy.conditions.len(), 1);
        assert_eq!(strategy.conditions[0].kind, ConditionKind::Indicator);
        assert_eq!(strategy.conditions[0].operator, Operator::LessThan);
        assert_eq!(strategy.conditions[0].indicator.as_deref(), Some("RSI"));
        assert_eq!(strategy.entry_actions[0].kind, ActionKind::Buy);
        assert_eq!(strategy.entry_actions[0].amount_type, AmountType::Fixed);
        assert!(strategy.exit_conditions.is_empty());
        assert!(strategy.exit_actions.is_empty());
        assert!(strategy.is_active);
        assert_eq!(strategy.risk_management.max_daily_trades, 3);
    }

    #[test]
    fn operator_snake_case_names() {
        assert_eq!(
            serde_json::to_string(&Operator::CrossesAbove).unwrap(),
            r#""crosses_above""#
        );
        assert_eq!(
            serde_json::from_str::<Operator>(r#""crosses_below""#).unwrap(),
            Operator::CrossesBelow
        );
    }

    #[test]
    fn crossing_operators_flagged() {
        assert!(Operator::CrossesAbove.is_crossing());
        assert!(Operator::CrossesBelow.is_crossing());
        assert!(!Operator::LessThan.is_crossing());
        assert!(!Operator::GreaterThan.is_crossing());
        assert!(!Operator::Equals.is_crossing());
    }

    #[test]
    fn risk_config_default_disables_limits() {
        let risk = RiskConfig::default();
        assert_eq!(risk.stop_loss, 0.0);
        assert_eq!(risk.take_profit, 0.0);
        assert_eq!(risk.max_position_size, 0.0);
        assert_eq!(risk.max_daily_trades, 0);
    }
}
