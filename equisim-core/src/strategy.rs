//! Strategy contract.
//!
//! Strategies are plain stateful objects driven bar-by-bar by the
//! engine. They emit intents ([`Signal`]s); the ledger decides whether
//! those intents become fills.

use crate::domain::{MarketBar, Signal, Transaction};
use crate::error::StrategyError;
use chrono::NaiveDate;

/// A trading strategy. Only `name` and `on_data` are mandatory; the
/// lifecycle hooks default to no-ops.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Check parameter consistency before the run starts. Runs once;
    /// a `false` fails the whole backtest up front.
    fn validate_parameters(&self) -> bool {
        true
    }

    /// Called once per bar, in stream order. The returned signals are
    /// applied in list order against the evolving portfolio state.
    fn on_data(&mut self, bar: &MarketBar) -> Result<Vec<Signal>, StrategyError>;

    /// Called after each of this strategy's signals fills.
    fn on_order_filled(&mut self, _transaction: &Transaction) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Called when the session date changes and once after the final
    /// bar.
    fn on_day_end(&mut self, _date: NaiveDate) -> Result<(), StrategyError> {
        Ok(())
    }
}
