//! Contrarian RSI strategy.

use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;

use equisim_core::{MarketBar, Signal, SignalKind, Strategy, StrategyError};

/// Per-symbol Wilder-smoothed gain/loss averages.
struct SymbolState {
    prev_close: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    deltas_seen: usize,
    long: bool,
}

impl SymbolState {
    fn new() -> Self {
        Self {
            prev_close: None,
            avg_gain: 0.0,
            avg_loss: 0.0,
            deltas_seen: 0,
            long: false,
        }
    }

    /// Feed one close; the first `period` deltas seed the averages with
    /// a simple mean, after which Wilder's smoothing takes over.
    fn push(&mut self, close: f64, period: usize) {
        let Some(prev) = self.prev_close.replace(close) else {
            return;
        };
        let delta = close - prev;
        let (gain, loss) = if delta > 0.0 {
            (delta, 0.0)
        } else {
            (0.0, -delta)
        };
        self.deltas_seen += 1;
        if self.deltas_seen <= period {
            self.avg_gain += gain / period as f64;
            self.avg_loss += loss / period as f64;
        } else {
            let n = period as f64;
            self.avg_gain = (self.avg_gain * (n - 1.0) + gain) / n;
            self.avg_loss = (self.avg_loss * (n - 1.0) + loss) / n;
        }
    }

    fn rsi(&self, period: usize) -> Option<f64> {
        if self.deltas_seen < period {
            return None;
        }
        if self.avg_loss == 0.0 {
            return Some(100.0);
        }
        let rs = self.avg_gain / self.avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}

/// Mean-reversion on the relative strength index: buy when a symbol is
/// oversold, close the position once it turns overbought. Signal
/// strength scales with how deep into the oversold zone the RSI sits.
pub struct Rsi {
    period: usize,
    oversold: f64,
    overbought: f64,
    states: HashMap<String, SymbolState>,
}

impl Rsi {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            period,
            oversold,
            overbought,
            states: HashMap::new(),
        }
    }
}

impl Strategy for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn validate_parameters(&self) -> bool {
        self.period > 0
            && self.oversold > 0.0
            && self.overbought < 100.0
            && self.oversold < self.overbought
    }

    fn on_data(&mut self, bar: &MarketBar) -> Result<Vec<Signal>, StrategyError> {
        let Some(close) = bar.close.to_f64() else {
            return Ok(Vec::new());
        };
        let state = self
            .states
            .entry(bar.symbol.clone())
            .or_insert_with(SymbolState::new);
        state.push(close, self.period);

        let Some(rsi) = state.rsi(self.period) else {
            return Ok(Vec::new());
        };

        if rsi <= self.oversold && !state.long {
            state.long = true;
            let strength = ((self.oversold - rsi) / self.oversold).clamp(0.0, 1.0);
            let signal = Signal::new(bar.timestamp, &bar.symbol, SignalKind::Buy, strength, "oversold")
                .map_err(|e| StrategyError::new(e.to_string()))?;
            return Ok(vec![signal]);
        }
        if rsi >= self.overbought && state.long {
            state.long = false;
            let signal =
                Signal::new(bar.timestamp, &bar.symbol, SignalKind::Close, 1.0, "overbought")
                    .map_err(|e| StrategyError::new(e.to_string()))?;
            return Ok(vec![signal]);
        }
        Ok(Vec::new())
    }
}
