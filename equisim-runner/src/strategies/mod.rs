//! Built-in strategies and the explicit registry that builds them.
//!
//! Strategies are constructed from [`StrategyConfig`] through a name ->
//! factory map. Nothing is discovered at runtime; a strategy exists
//! only if something registered it.

mod bollinger;
mod buy_and_hold;
mod ma_crossover;
mod rsi;

pub use bollinger::BollingerBands;
pub use buy_and_hold::BuyAndHold;
pub use ma_crossover::MaCrossover;
pub use rsi::Rsi;

use std::collections::BTreeMap;
use std::collections::HashMap;

use thiserror::Error;

use equisim_core::Strategy;

use crate::config::StrategyConfig;

type Params = HashMap<String, serde_json::Value>;
type Factory = Box<dyn Fn(&Params) -> Box<dyn Strategy> + Send + Sync>;

#[derive(Debug, Error)]
#[error("no strategy registered under '{0}'")]
pub struct UnknownStrategy(pub String);

/// Name -> factory map for custom strategies; the built-ins are always
/// available through their own config variants.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<String, Factory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&Params) -> Box<dyn Strategy> + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn build(&self, config: &StrategyConfig) -> Result<Box<dyn Strategy>, UnknownStrategy> {
        match config {
            StrategyConfig::MaCrossover {
                short_period,
                long_period,
            } => Ok(Box::new(MaCrossover::new(*short_period, *long_period))),
            StrategyConfig::BuyAndHold => Ok(Box::new(BuyAndHold::new())),
            StrategyConfig::Rsi {
                period,
                oversold,
                overbought,
            } => Ok(Box::new(Rsi::new(*period, *oversold, *overbought))),
            StrategyConfig::BollingerBands {
                period,
                num_std,
                buy_threshold,
                sell_threshold,
                bandwidth_threshold,
            } => Ok(Box::new(BollingerBands::new(
                *period,
                *num_std,
                *buy_threshold,
                *sell_threshold,
                *bandwidth_threshold,
            ))),
            StrategyConfig::Custom { name, params } => self
                .factories
                .get(name)
                .map(|factory| factory(params))
                .ok_or_else(|| UnknownStrategy(name.clone())),
        }
    }
}
