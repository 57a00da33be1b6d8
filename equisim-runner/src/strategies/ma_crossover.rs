//! Moving-average crossover strategy.

use std::collections::HashMap;
use std::collections::VecDeque;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use equisim_core::{MarketBar, Signal, SignalKind, Strategy, StrategyError};

/// Per-symbol rolling close window, long enough for the slow average.
struct Window {
    closes: VecDeque<Decimal>,
    capacity: usize,
    /// Whether the fast average was above the slow one on the prior bar.
    fast_above: Option<bool>,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
            fast_above: None,
        }
    }

    fn push(&mut self, close: Decimal) {
        if self.closes.len() == self.capacity {
            self.closes.pop_front();
        }
        self.closes.push_back(close);
    }

    fn sma(&self, period: usize) -> Option<f64> {
        if self.closes.len() < period {
            return None;
        }
        let sum: Decimal = self.closes.iter().rev().take(period).sum();
        (sum / Decimal::from(period as u64)).to_f64()
    }
}

/// Classic golden-cross/death-cross: buy when the short average crosses
/// above the long one, close the position when it crosses back below.
/// State is tracked per symbol, so one instance can run a multi-symbol
/// stream.
pub struct MaCrossover {
    short_period: usize,
    long_period: usize,
    windows: HashMap<String, Window>,
}

impl MaCrossover {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        Self {
            short_period,
            long_period,
            windows: HashMap::new(),
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn validate_parameters(&self) -> bool {
        self.short_period > 0 && self.short_period < self.long_period
    }

    fn on_data(&mut self, bar: &MarketBar) -> Result<Vec<Signal>, StrategyError> {
        let window = self
            .windows
            .entry(bar.symbol.clone())
            .or_insert_with(|| Window::new(self.long_period));
        window.push(bar.close);

        let (Some(fast), Some(slow)) = (window.sma(self.short_period), window.sma(self.long_period))
        else {
            return Ok(Vec::new());
        };

        let now_above = fast > slow;
        let was_above = window.fast_above.replace(now_above);

        let signal = match (was_above, now_above) {
            (Some(false), true) => Some((SignalKind::Buy, "golden cross")),
            (Some(true), false) => Some((SignalKind::Close, "death cross")),
            _ => None,
        };
        match signal {
            Some((kind, reason)) => {
                let signal = Signal::new(bar.timestamp, &bar.symbol, kind, 1.0, reason)
                    .map_err(|e| StrategyError::new(e.to_string()))?;
                Ok(vec![signal])
            }
            None => Ok(Vec::new()),
        }
    }
}
