//! Synthetic bar generation — seeded random walks for demos and tests.
//!
//! Synthetic data is a developer convenience, not a market model; it
//! only needs to be deterministic for a given seed and sane per bar.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use equisim_core::MarketBar;

/// Parameters for one symbol's random walk.
#[derive(Debug, Clone)]
pub struct WalkParams {
    pub symbol: String,
    pub start_price: Decimal,
    /// Per-bar drift as a fraction (0.0005 = 5 bps a day).
    pub drift: f64,
    /// Per-bar volatility as a fraction.
    pub volatility: f64,
}

impl WalkParams {
    pub fn new(symbol: impl Into<String>, start_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            start_price,
            drift: 0.0002,
            volatility: 0.015,
        }
    }
}

/// Generate weekday bars between `start` and `end` inclusive, one per
/// symbol per day, in (timestamp, symbol) order.
pub fn generate_bars(
    params: &[WalkParams],
    start: NaiveDate,
    end: NaiveDate,
    seed: u64,
) -> Vec<MarketBar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prices: Vec<Decimal> = params.iter().map(|p| p.start_price).collect();
    let mut bars = Vec::new();

    let mut date = start;
    while date <= end {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            let mut days_bars: Vec<MarketBar> = params
                .iter()
                .zip(prices.iter_mut())
                .map(|(param, price)| {
                    let step: f64 = rng.gen_range(-1.0..1.0);
                    let change = param.drift + step * param.volatility;
                    let open = *price;
                    let close = quantize(open * decimal_factor(change));
                    let spread: f64 = rng.gen_range(0.0..param.volatility / 2.0);
                    let high = quantize(open.max(close) * decimal_factor(spread));
                    let low = quantize(open.min(close) * decimal_factor(-spread));
                    *price = close;
                    MarketBar {
                        symbol: param.symbol.clone(),
                        timestamp: date.and_hms_opt(9, 0, 0).unwrap_or_default().and_utc(),
                        open,
                        high,
                        low,
                        close,
                        volume: rng.gen_range(100_000..5_000_000),
                    }
                })
                .collect();
            days_bars.sort_by(|a, b| a.symbol.cmp(&b.symbol));
            bars.extend(days_bars);
        }
        date += chrono::Duration::days(1);
    }
    bars
}

fn decimal_factor(change: f64) -> Decimal {
    Decimal::from_f64(1.0 + change).unwrap_or(Decimal::ONE)
}

/// Keep synthetic prices at two decimal places and strictly positive.
fn quantize(price: Decimal) -> Decimal {
    price.round_dp(2).max(dec!(0.01))
}
