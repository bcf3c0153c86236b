#![allow(dead_code)]

pub use stratbt::domain::backtest::{run_backtest, BacktestConfig};
pub use stratbt::domain::candle::Candle;
pub use stratbt::domain::error::BacktestError;
pub use stratbt::domain::strategy::{
    Action, ActionKind, AmountType, Condition, ConditionKind, Operator, OrderType, RiskConfig,
    Strategy,
};

pub const HOUR: i64 = 3600;

/// Hourly candle at bar index `i` with a flat body around `close`.
pub fn make_candle(i: usize, close: f64) -> Candle {
    Candle {
        time: i as i64 * HOUR,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_candle(i, close))
        .collect()
}

pub fn rsi_condition(operator: Operator, value: f64) -> Condition {
    Condition {
        id: "c-rsi".into(),
        kind: ConditionKind::Indicator,
        operator,
        value,
        indicator: Some("rsi".into()),
        parameter: None,
        timeframe: None,
    }
}

pub fn price_condition(operator: Operator, value: f64) -> Condition {
    Condition {
        id: "c-price".into(),
        kind: ConditionKind::Price,
        operator,
        value,
        indicator: None,
        parameter: None,
        timeframe: None,
    }
}

pub fn buy_fixed(amount: f64) -> Action {
    Action {
        id: "a-buy".into(),
        kind: ActionKind::Buy,
        amount,
        amount_type: AmountType::Fixed,
        order_type: OrderType::Market,
    }
}

pub fn make_strategy(conditions: Vec<Condition>, risk: RiskConfig) -> Strategy {
    Strategy {
        id: "s1".into(),
        name: "integration test strategy".into(),
        symbol: "BTCUSDT".into(),
        timeframe: "1h".into(),
        conditions,
        exit_conditions: vec![],
        entry_actions: vec![buy_fixed(100.0)],
        exit_actions: vec![],
        risk_management: risk,
        is_active: true,
    }
}
