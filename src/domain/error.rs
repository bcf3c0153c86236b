//! Domain error types.
//!
//! All failures are structured and reported to the caller; the engine
//! never substitutes defaults for malformed input it can detect.

/// Top-level error type for stratbt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BacktestError {
    #[error("insufficient data: have {bars} candles, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("invalid strategy: {reason}")]
    InvalidStrategy { reason: String },

    #[error("invalid candle sequence at index {index}: {reason}")]
    InvalidCandleSequence { index: usize, reason: String },
}

impl BacktestError {
    pub fn invalid_strategy(reason: impl Into<String>) -> Self {
        BacktestError::InvalidStrategy {
            reason: reason.into(),
        }
    }
}
