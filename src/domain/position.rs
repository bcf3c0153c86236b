//! Position state machine and closed-trade ledger.
//!
//! One position at a time per run: FLAT -> OPEN -> FLAT, repeating. No
//! pyramiding, no hedging. Closed trades are appended to an ordered
//! ledger and never mutated afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short; multiplies into pnl.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    Open,
    Closed,
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Signal,
    /// Force-closed at the last candle because the data ran out.
    EndOfData,
}

/// The currently open position. Existence of the value means "open".
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: i64,
    pub quantity: f64,
}

impl Position {
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity * self.side.sign()
    }

    /// Stop level for a percent distance from entry; None disables.
    pub fn stop_price(&self, stop_loss_pct: f64) -> Option<f64> {
        if stop_loss_pct <= 0.0 {
            return None;
        }
        let price = match self.side {
            Side::Long => self.entry_price * (1.0 - stop_loss_pct / 100.0),
            Side::Short => self.entry_price * (1.0 + stop_loss_pct / 100.0),
        };
        Some(price)
    }

    /// Target level for a percent distance from entry; None disables.
    pub fn target_price(&self, take_profit_pct: f64) -> Option<f64> {
        if take_profit_pct <= 0.0 {
            return None;
        }
        let price = match self.side {
            Side::Long => self.entry_price * (1.0 + take_profit_pct / 100.0),
            Side::Short => self.entry_price * (1.0 - take_profit_pct / 100.0),
        };
        Some(price)
    }

    pub fn stop_hit(&self, close: f64, stop_loss_pct: f64) -> Option<f64> {
        let stop = self.stop_price(stop_loss_pct)?;
        let hit = match self.side {
            Side::Long => close <= stop,
            Side::Short => close >= stop,
        };
        hit.then_some(stop)
    }

    pub fn target_hit(&self, close: f64, take_profit_pct: f64) -> Option<f64> {
        let target = self.target_price(take_profit_pct)?;
        let hit = match self.side {
            Side::Long => close >= target,
            Side::Short => close <= target,
        };
        hit.then_some(target)
    }
}

/// One round trip, immutable once closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub side: Side,
    pub entry_time: i64,
    pub entry_price: f64,
    pub exit_time: i64,
    pub exit_price: f64,
    pub quantity: f64,
    pub pnl: f64,
    pub status: TradeStatus,
    pub exit_reason: ExitReason,
}

/// Per-run tracker: the open position, the trade ledger, realized pnl,
/// and the daily entry counter.
#[derive(Debug, Default)]
pub struct Tracker {
    position: Option<Position>,
    trades: Vec<Trade>,
    realized_pnl: f64,
    next_trade_id: u64,
    current_day: Option<NaiveDate>,
    entries_today: u32,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker::default()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position
            .as_ref()
            .map(|p| p.unrealized_pnl(price))
            .unwrap_or(0.0)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Whether a new entry on `day` is allowed under the daily limit.
    /// Zero means unlimited. The day counter resets when the calendar
    /// day changes.
    pub fn can_enter(&mut self, day: NaiveDate, max_daily_trades: u32) -> bool {
        if self.current_day != Some(day) {
            self.current_day = Some(day);
            self.entries_today = 0;
        }
        max_daily_trades == 0 || self.entries_today < max_daily_trades
    }

    /// FLAT -> OPEN. Ignored (returns false) while a position is open.
    pub fn open(&mut self, side: Side, price: f64, time: i64, quantity: f64) -> bool {
        if self.position.is_some() {
            return false;
        }
        trace!(?side, price, quantity, "open position");
        self.position = Some(Position {
            side,
            entry_price: price,
            entry_time: time,
            quantity,
        });
        self.entries_today += 1;
        true
    }

    /// OPEN -> FLAT. Records the closed trade in the ledger.
    pub fn close(&mut self, price: f64, time: i64, reason: ExitReason) -> Option<&Trade> {
        let position = self.position.take()?;
        let pnl = position.unrealized_pnl(price);
        self.realized_pnl += pnl;
        self.next_trade_id += 1;
        trace!(id = self.next_trade_id, price, pnl, ?reason, "close position");
        self.trades.push(Trade {
            id: self.next_trade_id,
            side: position.side,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time: time,
            exit_price: price,
            quantity: position.quantity,
            pnl,
            status: TradeStatus::Closed,
            exit_reason: reason,
        });
        self.trades.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position() -> Position {
        Position {
            side: Side::Long,
            entry_price: 100.0,
            entry_time: 0,
            quantity: 2.0,
        }
    }

    fn short_position() -> Position {
        Position {
            side: Side::Short,
            entry_price: 100.0,
            entry_time: 0,
            quantity: 2.0,
        }
    }

    #[test]
    fn unrealized_pnl_long() {
        let pos = long_position();
        assert!((pos.unrealized_pnl(110.0) - 20.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(95.0) - (-10.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl_short() {
        let pos = short_position();
        assert!((pos.unrealized_pnl(90.0) - 20.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(105.0) - (-10.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn stop_hit_long() {
        let pos = long_position();
        // 5% stop at 95
        assert_eq!(pos.stop_hit(94.0, 5.0), Some(95.0));
        assert_eq!(pos.stop_hit(95.0, 5.0), Some(95.0));
        assert_eq!(pos.stop_hit(96.0, 5.0), None);
    }

    #[test]
    fn stop_hit_short() {
        let pos = short_position();
        assert_eq!(pos.stop_hit(106.0, 5.0), Some(105.0));
        assert_eq!(pos.stop_hit(104.0, 5.0), None);
    }

    #[test]
    fn target_hit_long() {
        let pos = long_position();
        assert_eq!(pos.target_hit(111.0, 10.0), Some(110.0));
        assert_eq!(pos.target_hit(109.0, 10.0), None);
    }

    #[test]
    fn target_hit_short() {
        let pos = short_position();
        assert_eq!(pos.target_hit(89.0, 10.0), Some(90.0));
        assert_eq!(pos.target_hit(91.0, 10.0), None);
    }

    #[test]
    fn zero_pct_disables_stop_and_target() {
        let pos = long_position();
        assert_eq!(pos.stop_hit(0.0, 0.0), None);
        assert_eq!(pos.target_hit(1_000_000.0, 0.0), None);
    }

    #[test]
    fn tracker_open_close_round_trip() {
        let mut tracker = Tracker::new();
        assert!(!tracker.is_open());

        assert!(tracker.open(Side::Long, 100.0, 0, 1.5));
        assert!(tracker.is_open());

        let trade = tracker.close(110.0, 3600, ExitReason::TakeProfit).unwrap();
        assert_eq!(trade.id, 1);
        assert_eq!(trade.side, Side::Long);
        assert!((trade.pnl - 15.0).abs() < f64::EPSILON);
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.exit_reason, ExitReason::TakeProfit);

        assert!(!tracker.is_open());
        assert!((tracker.realized_pnl() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tracker_ignores_second_open() {
        let mut tracker = Tracker::new();
        assert!(tracker.open(Side::Long, 100.0, 0, 1.0));
        assert!(!tracker.open(Side::Long, 101.0, 60, 1.0));

        let pos = tracker.position().unwrap();
        assert!((pos.entry_price - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tracker_close_when_flat_is_none() {
        let mut tracker = Tracker::new();
        assert!(tracker.close(100.0, 0, ExitReason::Signal).is_none());
    }

    #[test]
    fn tracker_trade_ids_sequential() {
        let mut tracker = Tracker::new();
        for i in 0..3 {
            tracker.open(Side::Long, 100.0, i * 120, 1.0);
            tracker.close(101.0, i * 120 + 60, ExitReason::Signal);
        }
        let ids: Vec<u64> = tracker.trades().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn daily_limit_enforced_and_resets() {
        let mut tracker = Tracker::new();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();

        for _ in 0..2 {
            assert!(tracker.can_enter(monday, 2));
            tracker.open(Side::Long, 100.0, 0, 1.0);
            tracker.close(101.0, 60, ExitReason::Signal);
        }
        assert!(!tracker.can_enter(monday, 2));

        // new day, counter resets
        assert!(tracker.can_enter(tuesday, 2));
    }

    #[test]
    fn daily_limit_zero_is_unlimited() {
        let mut tracker = Tracker::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        for _ in 0..10 {
            assert!(tracker.can_enter(day, 0));
            tracker.open(Side::Long, 100.0, 0, 1.0);
            tracker.close(100.0, 60, ExitReason::Signal);
        }
    }

    #[test]
    fn realized_pnl_accumulates_across_trades() {
        let mut tracker = Tracker::new();
        tracker.open(Side::Long, 100.0, 0, 1.0);
        tracker.close(110.0, 60, ExitReason::Signal);
        tracker.open(Side::Short, 110.0, 120, 1.0);
        tracker.close(105.0, 180, ExitReason::Signal);

        assert!((tracker.realized_pnl() - 15.0).abs() < f64::EPSILON);
        assert_eq!(tracker.trades().len(), 2);
    }
}
