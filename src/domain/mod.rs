//! Core domain types and logic.

pub mod backtest;
pub mod candle;
pub mod error;
pub mod evaluator;
pub mod indicator;
pub mod metrics;
pub mod position;
pub mod strategy;
