//! stratbt — rule-based trading strategy backtester.
//!
//! Replays an ordered historical candle series through a strategy's
//! entry/exit conditions, simulates fills and position state bar by bar,
//! and produces aggregate performance statistics.
//!
//! The crate is a pure core: candle retrieval, persistence, and display
//! all live with the caller. One backtest is one synchronous pass over an
//! immutable candle slice; independent runs may execute on parallel
//! workers sharing the read-only candles and strategy.

pub mod domain;
