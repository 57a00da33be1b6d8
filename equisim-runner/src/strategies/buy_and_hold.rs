//! Buy-and-hold baseline.

use std::collections::HashSet;

use equisim_core::{MarketBar, Signal, SignalKind, Strategy, StrategyError};

/// Buys each symbol once, on its first bar, and never trades again.
/// Useful as the benchmark every other strategy has to beat.
#[derive(Default)]
pub struct BuyAndHold {
    entered: HashSet<String>,
}

impl BuyAndHold {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn on_data(&mut self, bar: &MarketBar) -> Result<Vec<Signal>, StrategyError> {
        if !self.entered.insert(bar.symbol.clone()) {
            return Ok(Vec::new());
        }
        let signal = Signal::new(bar.timestamp, &bar.symbol, SignalKind::Buy, 1.0, "initial entry")
            .map_err(|e| StrategyError::new(e.to_string()))?;
        Ok(vec![signal])
    }
}
