//! Simulation engine — the event loop that drives a strategy over a
//! bar stream and settles its intents through the ledger.
//!
//! The loop is strictly sequential: bars arrive in (timestamp, symbol)
//! order, each bar's signals apply in list order against the evolving
//! portfolio, and every bar ends with an equity snapshot. Cancellation
//! and pause are cooperative, polled once per bar.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::MarketDataSource;
use crate::domain::{MarketBar, OrderRequest, OrderSide, Signal, SignalKind};
use crate::error::{ConfigError, DataError, EngineError};
use crate::ledger::PortfolioLedger;
use crate::strategy::Strategy;

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    Initialized,
    Running,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

/// Run window and sizing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub initial_capital: Decimal,
    /// Fraction of equity committed per unsized buy, scaled by signal
    /// strength.
    pub sizing_fraction: Decimal,
}

impl EngineConfig {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, initial_capital: Decimal) -> Self {
        Self {
            start,
            end,
            initial_capital,
            sizing_fraction: dec!(0.10),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start >= self.end {
            return Err(ConfigError::InvalidDateRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.sizing_fraction <= Decimal::ZERO || self.sizing_fraction > Decimal::ONE {
            return Err(ConfigError::InvalidSizingFraction(self.sizing_fraction));
        }
        Ok(())
    }
}

/// Shared cancel/pause flags. Clone freely; all clones observe the same
/// flags.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    cancel: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.pause.store(paused, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.pause.load(Ordering::SeqCst)
    }
}

/// Progress snapshot passed to the progress callback after each bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub status: EngineStatus,
    pub processed: usize,
    /// Total bar count when the source knows it.
    pub total: Option<usize>,
}

impl Progress {
    pub fn fraction(&self) -> Option<f64> {
        self.total
            .filter(|&t| t > 0)
            .map(|t| self.processed as f64 / t as f64)
    }
}

/// A signal that did not become a fill, with the reason it was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedSignal {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub reason: String,
}

/// One point on the equity curve, taken after all of a bar's signals
/// settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// What a run produced. `Cancelled` outcomes carry everything processed
/// up to the cancellation point and are valid partial results.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: EngineStatus,
    pub equity_curve: Vec<EquityPoint>,
    pub dropped_signals: Vec<DroppedSignal>,
    pub bar_count: usize,
}

type ProgressCallback = Box<dyn Fn(&Progress) + Send>;

/// Drives one backtest run.
pub struct SimulationEngine {
    config: EngineConfig,
    control: ControlHandle,
    progress_callback: Option<ProgressCallback>,
    pause_poll: Duration,
}

impl SimulationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            control: ControlHandle::new(),
            progress_callback: None,
            pause_poll: Duration::from_millis(10),
        }
    }

    /// Handle for cancelling or pausing the run from another thread.
    pub fn control_handle(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn with_progress(mut self, callback: impl Fn(&Progress) + Send + 'static) -> Self {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Run the strategy over the source to completion, cancellation, or
    /// the first fatal error.
    ///
    /// Config problems surface as `Err` before any bar is touched.
    /// Data and strategy errors abort mid-run and also surface as
    /// `Err`; the ledger retains whatever state had settled by then.
    pub fn run(
        &self,
        strategy: &mut dyn Strategy,
        source: &mut dyn MarketDataSource,
        ledger: &mut PortfolioLedger,
    ) -> Result<RunOutcome, EngineError> {
        self.config.validate()?;
        if !strategy.validate_parameters() {
            return Err(ConfigError::StrategyParameters(strategy.name().to_string()).into());
        }

        info!(strategy = strategy.name(), start = %self.config.start, end = %self.config.end, "run starting");

        let total = source.size_hint();
        let mut equity_curve = Vec::new();
        let mut dropped_signals = Vec::new();
        let mut prev_key: Option<(DateTime<Utc>, String)> = None;
        let mut open_session: Option<NaiveDate> = None;
        let mut processed = 0usize;

        let status = loop {
            if self.control.is_cancelled() {
                info!(processed, "run cancelled");
                break EngineStatus::Cancelled;
            }
            while self.control.is_paused() && !self.control.is_cancelled() {
                std::thread::sleep(self.pause_poll);
            }

            let bar = match source.next_bar()? {
                Some(bar) => bar,
                None => {
                    if let Some(date) = open_session {
                        strategy.on_day_end(date)?;
                    }
                    break EngineStatus::Completed;
                }
            };

            let (timestamp, symbol) = bar.ordering_key();
            if let Some((prev_ts, prev_sym)) = &prev_key {
                // The key must strictly increase. A repeat of the exact
                // key is a duplicate bar, not a reordering.
                if (timestamp, symbol) == (*prev_ts, prev_sym.as_str()) {
                    return Err(DataError::MalformedBar {
                        symbol: symbol.to_string(),
                        timestamp,
                        reason: "duplicate ordering key".into(),
                    }
                    .into());
                }
                if (timestamp, symbol) < (*prev_ts, prev_sym.as_str()) {
                    return Err(DataError::OutOfOrder {
                        symbol: symbol.to_string(),
                        timestamp,
                        prev_symbol: prev_sym.clone(),
                        prev_timestamp: *prev_ts,
                    }
                    .into());
                }
            }
            prev_key = Some((timestamp, symbol.to_string()));

            // Bars outside the run window are consumed but not traded.
            if bar.timestamp < self.config.start || bar.timestamp > self.config.end {
                continue;
            }
            if !bar.is_sane() {
                return Err(DataError::MalformedBar {
                    symbol: bar.symbol.clone(),
                    timestamp: bar.timestamp,
                    reason: "high/low do not bracket open/close".into(),
                }
                .into());
            }

            let session = bar.session_date();
            if let Some(open) = open_session {
                if session != open {
                    strategy.on_day_end(open)?;
                }
            }
            open_session = Some(session);

            ledger.mark(&bar.symbol, bar.close);

            let signals = strategy.on_data(&bar)?;
            for signal in signals {
                self.apply_signal(strategy, ledger, &bar, &signal, &mut dropped_signals)?;
            }

            equity_curve.push(EquityPoint {
                timestamp: bar.timestamp,
                value: ledger.equity(),
            });
            processed += 1;

            if let Some(callback) = &self.progress_callback {
                callback(&Progress {
                    status: EngineStatus::Running,
                    processed,
                    total,
                });
            }
        };

        info!(?status, processed, final_equity = %ledger.equity(),
              realized_pnl = %ledger.portfolio.realized_pnl_net(), "run finished");
        Ok(RunOutcome {
            status,
            equity_curve,
            dropped_signals,
            bar_count: processed,
        })
    }

    /// Translate one signal into zero or more orders and settle them.
    /// Rejections become dropped-signal records, never errors.
    fn apply_signal(
        &self,
        strategy: &mut dyn Strategy,
        ledger: &mut PortfolioLedger,
        bar: &MarketBar,
        signal: &Signal,
        dropped: &mut Vec<DroppedSignal>,
    ) -> Result<(), EngineError> {
        let price = signal.limit_price.unwrap_or(bar.close);
        match signal.kind {
            SignalKind::Hold => {}
            SignalKind::Buy => {
                let quantity = match signal.quantity {
                    Some(q) => q,
                    None => self.size_buy(ledger, signal.strength, price),
                };
                if quantity == 0 {
                    Self::drop_signal(dropped, signal, "sized to zero shares");
                    return Ok(());
                }
                let order = Self::build_order(signal, OrderSide::Buy, quantity);
                self.settle(strategy, ledger, &order, price, bar.timestamp, signal, dropped)?;
            }
            SignalKind::Sell => {
                let held = ledger.position_quantity(&signal.symbol);
                let quantity = signal.quantity.unwrap_or(held);
                if quantity == 0 {
                    Self::drop_signal(dropped, signal, "nothing to sell");
                    return Ok(());
                }
                let order = Self::build_order(signal, OrderSide::Sell, quantity);
                self.settle(strategy, ledger, &order, price, bar.timestamp, signal, dropped)?;
            }
            SignalKind::Close => {
                let held = ledger.position_quantity(&signal.symbol);
                if held == 0 {
                    Self::drop_signal(dropped, signal, "no open position to close");
                    return Ok(());
                }
                let order = OrderRequest::market(&signal.symbol, OrderSide::Sell, held);
                self.settle(strategy, ledger, &order, price, bar.timestamp, signal, dropped)?;
            }
            SignalKind::CloseAll => {
                let mut symbols: Vec<String> =
                    ledger.portfolio.positions.keys().cloned().collect();
                if symbols.is_empty() {
                    Self::drop_signal(dropped, signal, "no open positions to close");
                    return Ok(());
                }
                // Deterministic liquidation order.
                symbols.sort();
                for symbol in symbols {
                    let held = ledger.position_quantity(&symbol);
                    let mark = ledger
                        .marks()
                        .get(&symbol)
                        .copied()
                        .unwrap_or(price);
                    let order = OrderRequest::market(&symbol, OrderSide::Sell, held);
                    self.settle(strategy, ledger, &order, mark, bar.timestamp, signal, dropped)?;
                }
            }
        }
        Ok(())
    }

    /// Limit-priced signals produce limit orders, filled at the limit.
    fn build_order(signal: &Signal, side: OrderSide, quantity: u64) -> OrderRequest {
        match signal.limit_price {
            Some(limit) => OrderRequest::limit(&signal.symbol, side, quantity, limit),
            None => OrderRequest::market(&signal.symbol, side, quantity),
        }
    }

    /// Unsized buys commit `equity * sizing_fraction * |strength|`,
    /// floored to whole shares.
    fn size_buy(&self, ledger: &PortfolioLedger, strength: f64, price: Decimal) -> u64 {
        let strength = Decimal::try_from(strength.abs()).unwrap_or(Decimal::ZERO);
        if price <= Decimal::ZERO {
            return 0;
        }
        let budget = ledger.equity() * self.config.sizing_fraction * strength;
        (budget / price).floor().to_u64().unwrap_or(0)
    }

    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        strategy: &mut dyn Strategy,
        ledger: &mut PortfolioLedger,
        order: &OrderRequest,
        price: Decimal,
        timestamp: DateTime<Utc>,
        signal: &Signal,
        dropped: &mut Vec<DroppedSignal>,
    ) -> Result<(), EngineError> {
        match ledger.execute(order, price, timestamp) {
            Ok(transaction) => {
                debug!(symbol = %transaction.symbol, side = ?transaction.side,
                       quantity = transaction.quantity, price = %transaction.fill_price, "fill");
                strategy.on_order_filled(&transaction)?;
            }
            Err(reason) => {
                warn!(symbol = %order.symbol, %reason, "order rejected");
                Self::drop_signal(dropped, signal, &reason.to_string());
            }
        }
        Ok(())
    }

    fn drop_signal(dropped: &mut Vec<DroppedSignal>, signal: &Signal, reason: &str) {
        dropped.push(DroppedSignal {
            timestamp: signal.timestamp,
            symbol: signal.symbol.clone(),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::CostModel;
    use crate::data::VecSource;
    use crate::error::StrategyError;
    use crate::ledger::RiskLimits;
    use chrono::TimeZone;

    fn bar(day: u32, close: Decimal) -> MarketBar {
        MarketBar {
            symbol: "005930".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
            open: close,
            high: close + dec!(500),
            low: close - dec!(500),
            close,
            volume: 1_000,
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            dec!(10000000),
        )
    }

    fn ledger() -> PortfolioLedger {
        let limits = RiskLimits {
            max_position_fraction: dec!(10),
            max_total_exposure: dec!(10),
            max_sector_fraction: dec!(10),
            cash_buffer: Decimal::ZERO,
        };
        PortfolioLedger::new(dec!(10000000), CostModel::default(), limits)
    }

    /// Emits a fixed script of (bar index, signal) pairs.
    struct Scripted {
        script: Vec<(usize, Signal)>,
        seen: usize,
        day_ends: usize,
        fills: usize,
    }

    impl Scripted {
        fn new(script: Vec<(usize, Signal)>) -> Self {
            Self {
                script,
                seen: 0,
                day_ends: 0,
                fills: 0,
            }
        }
    }

    impl Strategy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn on_data(&mut self, _bar: &MarketBar) -> Result<Vec<Signal>, StrategyError> {
            let index = self.seen;
            self.seen += 1;
            Ok(self
                .script
                .iter()
                .filter(|(i, _)| *i == index)
                .map(|(_, s)| s.clone())
                .collect())
        }

        fn on_order_filled(&mut self, _tx: &crate::domain::Transaction) -> Result<(), StrategyError> {
            self.fills += 1;
            Ok(())
        }

        fn on_day_end(&mut self, _date: NaiveDate) -> Result<(), StrategyError> {
            self.day_ends += 1;
            Ok(())
        }
    }

    fn signal(day: u32, kind: SignalKind) -> Signal {
        Signal::new(
            Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap(),
            "005930",
            kind,
            1.0,
            "test",
        )
        .unwrap()
    }

    #[test]
    fn completed_run_snapshots_every_bar() {
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![bar(4, dec!(70000)), bar(5, dec!(71000)), bar(6, dec!(69000))]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();

        assert_eq!(outcome.status, EngineStatus::Completed);
        assert_eq!(outcome.bar_count, 3);
        assert_eq!(outcome.equity_curve.len(), 3);
        // flat strategy: every snapshot is all-cash
        assert!(outcome.equity_curve.iter().all(|p| p.value == dec!(10000000)));
        // one day-end per session date
        assert_eq!(strategy.day_ends, 3);
    }

    #[test]
    fn round_trip_settles_to_capital_minus_costs() {
        let script = vec![
            (0, signal(4, SignalKind::Buy).with_quantity(10).unwrap()),
            (2, signal(6, SignalKind::Close)),
        ];
        let mut strategy = Scripted::new(script);
        let mut source = VecSource::new(vec![
            bar(4, dec!(70000)),
            bar(5, dec!(70000)),
            bar(6, dec!(70000)),
        ]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();

        assert_eq!(outcome.status, EngineStatus::Completed);
        assert_eq!(strategy.fills, 2);
        assert!(ledger.portfolio.positions.is_empty());
        // flat prices: final cash is capital minus total friction
        let expected = dec!(10000000) - ledger.portfolio.total_costs();
        assert_eq!(ledger.portfolio.cash, expected);
        assert_eq!(outcome.equity_curve.last().map(|p| p.value), Some(expected));
    }

    #[test]
    fn signals_apply_in_list_order_within_a_bar() {
        // Buy then Close on the same bar: the close sees the buy's fill.
        let script = vec![
            (0, signal(4, SignalKind::Buy).with_quantity(10).unwrap()),
            (0, signal(4, SignalKind::Close)),
        ];
        let mut strategy = Scripted::new(script);
        let mut source = VecSource::new(vec![bar(4, dec!(70000))]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();

        assert_eq!(strategy.fills, 2);
        assert!(outcome.dropped_signals.is_empty());
        assert!(ledger.portfolio.positions.is_empty());
    }

    #[test]
    fn rejected_order_becomes_dropped_signal() {
        // 1,000 shares at 70,000 needs 70M against 10M capital.
        let script = vec![(0, signal(4, SignalKind::Buy).with_quantity(1000).unwrap())];
        let mut strategy = Scripted::new(script);
        let mut source = VecSource::new(vec![bar(4, dec!(70000))]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();

        assert_eq!(outcome.status, EngineStatus::Completed);
        assert_eq!(outcome.dropped_signals.len(), 1);
        assert!(outcome.dropped_signals[0].reason.contains("insufficient cash"));
        assert_eq!(ledger.portfolio.cash, dec!(10000000));
    }

    #[test]
    fn close_without_position_is_dropped() {
        let script = vec![(0, signal(4, SignalKind::Close))];
        let mut strategy = Scripted::new(script);
        let mut source = VecSource::new(vec![bar(4, dec!(70000))]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();
        assert_eq!(outcome.dropped_signals.len(), 1);
    }

    #[test]
    fn out_of_order_bars_abort_the_run() {
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![bar(5, dec!(70000)), bar(4, dec!(70000))]);
        let mut ledger = ledger();

        let err = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, EngineError::Data(DataError::OutOfOrder { .. })));
    }

    #[test]
    fn progress_fraction_reaches_one_on_completion() {
        use std::sync::{Arc, Mutex};
        let last = Arc::new(Mutex::new(None));
        let engine = SimulationEngine::new(config()).with_progress({
            let last = Arc::clone(&last);
            move |progress| {
                *last.lock().unwrap() = progress.fraction();
            }
        });
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![bar(4, dec!(70000)), bar(5, dec!(71000))]);
        let mut ledger = ledger();

        engine.run(&mut strategy, &mut source, &mut ledger).unwrap();
        assert_eq!(*last.lock().unwrap(), Some(1.0));
    }

    #[test]
    fn limit_priced_signal_fills_at_the_limit() {
        let buy = signal(4, SignalKind::Buy)
            .with_quantity(10)
            .unwrap()
            .with_limit_price(dec!(69500));
        let mut strategy = Scripted::new(vec![(0, buy)]);
        let mut source = VecSource::new(vec![bar(4, dec!(70000))]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();

        assert_eq!(outcome.status, EngineStatus::Completed);
        let tx = &ledger.portfolio.transactions[0];
        assert_eq!(tx.fill_price, dec!(69500));
        assert_eq!(tx.quantity, 10);
    }

    #[test]
    fn duplicate_bars_abort_as_malformed() {
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![bar(5, dec!(70000)), bar(5, dec!(70000))]);
        let mut ledger = ledger();

        let err = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, EngineError::Data(DataError::MalformedBar { .. })));
    }

    #[test]
    fn invalid_date_range_fails_before_any_bar() {
        let config = EngineConfig::new(
            Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            dec!(10000000),
        );
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![bar(4, dec!(70000))]);
        let mut ledger = ledger();

        let err = SimulationEngine::new(config)
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::InvalidDateRange { .. })));
        assert_eq!(source.size_hint(), Some(1));
    }

    #[test]
    fn cancellation_yields_partial_outcome() {
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![bar(4, dec!(70000)), bar(5, dec!(70000))]);
        let mut ledger = ledger();

        let engine = SimulationEngine::new(config());
        engine.control_handle().request_cancel();
        let outcome = engine.run(&mut strategy, &mut source, &mut ledger).unwrap();

        assert_eq!(outcome.status, EngineStatus::Cancelled);
        assert_eq!(outcome.bar_count, 0);
    }

    #[test]
    fn pause_parks_the_loop_then_resumes() {
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![
            bar(4, dec!(70000)),
            bar(5, dec!(70000)),
            bar(6, dec!(70000)),
        ]);
        let mut ledger = ledger();

        let engine = SimulationEngine::new(config());
        let control = engine.control_handle();
        control.set_paused(true);

        let resumer = std::thread::spawn({
            let control = control.clone();
            move || {
                std::thread::sleep(Duration::from_millis(50));
                control.set_paused(false);
            }
        });

        let started = std::time::Instant::now();
        let outcome = engine.run(&mut strategy, &mut source, &mut ledger).unwrap();
        resumer.join().unwrap();

        // the run waited out the pause and then processed everything
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(outcome.status, EngineStatus::Completed);
        assert_eq!(outcome.bar_count, 3);
    }

    #[test]
    fn unsized_buy_scales_with_strength() {
        let half = Signal::new(
            Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
            "005930",
            SignalKind::Buy,
            0.5,
            "test",
        )
        .unwrap();
        let script = vec![(0, half)];
        let mut strategy = Scripted::new(script);
        let mut source = VecSource::new(vec![bar(4, dec!(70000))]);
        let mut ledger = ledger();

        SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();
        // 10M * 0.10 * 0.5 / 70,000 = 7.14 -> 7 shares
        assert_eq!(ledger.position_quantity("005930"), 7);
    }

    #[test]
    fn bars_outside_window_are_skipped() {
        let mut strategy = Scripted::new(vec![]);
        let mut source = VecSource::new(vec![
            MarketBar {
                timestamp: Utc.with_ymd_and_hms(2024, 2, 28, 9, 0, 0).unwrap(),
                ..bar(4, dec!(70000))
            },
            bar(4, dec!(70000)),
        ]);
        let mut ledger = ledger();

        let outcome = SimulationEngine::new(config())
            .run(&mut strategy, &mut source, &mut ledger)
            .unwrap();
        assert_eq!(outcome.bar_count, 1);
        // the skipped bar never reached on_data
        assert_eq!(strategy.seen, 1);
    }
}
