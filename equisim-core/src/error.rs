//! Fatal error kinds shared across the engine.
//!
//! Per-order rejections (risk limits, insufficient funds) are not here —
//! they are recoverable and live in [`crate::ledger::RejectReason`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Invalid backtest parameters. Surfaced before any data is consumed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("start date {start} must be before end date {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),
    #[error("sizing fraction must be in (0, 1], got {0}")]
    InvalidSizingFraction(Decimal),
    #[error("strategy '{0}' rejected its own parameters")]
    StrategyParameters(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Malformed or out-of-order market data. Fatal: aborts the run at the
/// offending bar.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(
        "bar out of order: ({timestamp}, {symbol}) arrived after ({prev_timestamp}, {prev_symbol})"
    )]
    OutOfOrder {
        symbol: String,
        timestamp: DateTime<Utc>,
        prev_symbol: String,
        prev_timestamp: DateTime<Utc>,
    },
    #[error("malformed bar for {symbol} at {timestamp}: {reason}")]
    MalformedBar {
        symbol: String,
        timestamp: DateTime<Utc>,
        reason: String,
    },
    #[error("data source error: {0}")]
    Source(String),
}

/// An error raised by a strategy callback. Fatal: propagated to the
/// caller, the ledger is guaranteed consistent (order application is
/// atomic, so no half-applied transaction can exist).
#[derive(Debug, Error)]
#[error("strategy error: {0}")]
pub struct StrategyError(pub String);

impl StrategyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Any fatal condition that aborts a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("{0}")]
    Strategy(#[from] StrategyError),
}
