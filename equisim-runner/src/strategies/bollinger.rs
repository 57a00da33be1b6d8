//! Bollinger band %B reversal strategy.

use std::collections::HashMap;
use std::collections::VecDeque;

use rust_decimal::prelude::ToPrimitive;

use equisim_core::{MarketBar, Signal, SignalKind, Strategy, StrategyError};

/// Per-symbol rolling close window sized to the band period.
struct Window {
    closes: VecDeque<f64>,
    capacity: usize,
    long: bool,
}

struct Bands {
    percent_b: f64,
    bandwidth: f64,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            closes: VecDeque::with_capacity(capacity),
            capacity,
            long: false,
        }
    }

    fn push(&mut self, close: f64) {
        if self.closes.len() == self.capacity {
            self.closes.pop_front();
        }
        self.closes.push_back(close);
    }

    /// Bands over the full window: middle is the SMA, the envelope sits
    /// `num_std` sample standard deviations out.
    fn bands(&self, num_std: f64) -> Option<Bands> {
        if self.closes.len() < self.capacity || self.capacity < 2 {
            return None;
        }
        let n = self.closes.len() as f64;
        let middle = self.closes.iter().sum::<f64>() / n;
        let variance = self
            .closes
            .iter()
            .map(|c| (c - middle).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        let spread = variance.sqrt() * num_std;
        let upper = middle + spread;
        let lower = middle - spread;
        if upper <= lower || middle <= 0.0 {
            return None;
        }
        let close = *self.closes.back()?;
        Some(Bands {
            percent_b: (close - lower) / (upper - lower),
            bandwidth: (upper - lower) / middle,
        })
    }
}

/// Volatility reversal on Bollinger %B: buy when the close sinks under
/// the lower region of the band, close the position when it pushes into
/// the upper region. Signals are suppressed while the bands are
/// squeezed tighter than `bandwidth_threshold`.
pub struct BollingerBands {
    period: usize,
    num_std: f64,
    buy_threshold: f64,
    sell_threshold: f64,
    bandwidth_threshold: f64,
    windows: HashMap<String, Window>,
}

impl BollingerBands {
    pub fn new(
        period: usize,
        num_std: f64,
        buy_threshold: f64,
        sell_threshold: f64,
        bandwidth_threshold: f64,
    ) -> Self {
        Self {
            period,
            num_std,
            buy_threshold,
            sell_threshold,
            bandwidth_threshold,
            windows: HashMap::new(),
        }
    }
}

impl Strategy for BollingerBands {
    fn name(&self) -> &str {
        "bollinger_bands"
    }

    fn validate_parameters(&self) -> bool {
        self.period >= 2
            && self.num_std > 0.0
            && self.buy_threshold >= 0.0
            && self.buy_threshold < self.sell_threshold
            && self.sell_threshold <= 1.0
            && self.bandwidth_threshold >= 0.0
    }

    fn on_data(&mut self, bar: &MarketBar) -> Result<Vec<Signal>, StrategyError> {
        let Some(close) = bar.close.to_f64() else {
            return Ok(Vec::new());
        };
        let window = self
            .windows
            .entry(bar.symbol.clone())
            .or_insert_with(|| Window::new(self.period));
        window.push(close);

        let Some(bands) = window.bands(self.num_std) else {
            return Ok(Vec::new());
        };
        // squeeze filter
        if bands.bandwidth < self.bandwidth_threshold {
            return Ok(Vec::new());
        }

        if bands.percent_b <= self.buy_threshold && !window.long {
            window.long = true;
            let strength = if self.buy_threshold > 0.0 {
                ((self.buy_threshold - bands.percent_b) / self.buy_threshold).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let signal =
                Signal::new(bar.timestamp, &bar.symbol, SignalKind::Buy, strength, "lower band")
                    .map_err(|e| StrategyError::new(e.to_string()))?;
            return Ok(vec![signal]);
        }
        if bands.percent_b >= self.sell_threshold && window.long {
            window.long = false;
            let signal =
                Signal::new(bar.timestamp, &bar.symbol, SignalKind::Close, 1.0, "upper band")
                    .map_err(|e| StrategyError::new(e.to_string()))?;
            return Ok(vec![signal]);
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar(i: i64, close: Decimal) -> MarketBar {
        MarketBar {
            symbol: "005930".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
                + chrono::Duration::days(i),
            open: close,
            high: close + dec!(100),
            low: close - dec!(100),
            close,
            volume: 1_000,
        }
    }

    fn strategy() -> BollingerBands {
        BollingerBands::new(4, 2.0, 0.2, 0.8, 0.0)
    }

    #[test]
    fn rejects_bad_thresholds() {
        assert!(!BollingerBands::new(1, 2.0, 0.2, 0.8, 0.0).validate_parameters());
        assert!(!BollingerBands::new(20, 2.0, 0.8, 0.2, 0.0).validate_parameters());
        assert!(!BollingerBands::new(20, 0.0, 0.2, 0.8, 0.0).validate_parameters());
        assert!(BollingerBands::new(20, 2.0, 0.2, 0.8, 0.1).validate_parameters());
    }

    #[test]
    fn silent_during_warmup() {
        let mut s = strategy();
        for i in 0..3 {
            assert!(s.on_data(&bar(i, dec!(1000) + Decimal::from(i))).unwrap().is_empty());
        }
    }

    #[test]
    fn buys_below_the_lower_band_then_closes_above_the_upper() {
        let mut s = strategy();
        let closes = [
            dec!(1000),
            dec!(1010),
            dec!(990),
            dec!(1005), // warmup, close inside the bands
            dec!(900),  // collapse under the lower band -> buy
            dec!(1000),
            dec!(1200), // surge through the upper band -> close
        ];
        let mut kinds = Vec::new();
        for (i, close) in closes.iter().enumerate() {
            for signal in s.on_data(&bar(i as i64, *close)).unwrap() {
                kinds.push(signal.kind);
            }
        }
        assert_eq!(kinds, vec![SignalKind::Buy, SignalKind::Close]);
    }

    #[test]
    fn squeeze_suppresses_signals() {
        // a dip that buys with no bandwidth floor stays silent under one
        let closes = [dec!(1001), dec!(1000), dec!(1001), dec!(999)];
        let mut open = BollingerBands::new(4, 2.0, 0.2, 0.8, 0.0);
        let mut squeezed = BollingerBands::new(4, 2.0, 0.2, 0.8, 0.05);
        let mut open_signals = Vec::new();
        for (i, close) in closes.iter().enumerate() {
            open_signals.extend(open.on_data(&bar(i as i64, *close)).unwrap());
            assert!(squeezed.on_data(&bar(i as i64, *close)).unwrap().is_empty());
        }
        assert_eq!(open_signals.len(), 1);
        assert_eq!(open_signals[0].kind, SignalKind::Buy);
    }
}
