//! Backtest orchestration: config in, [`BacktestResult`] out.

use thiserror::Error;
use tracing::{error, info};

use equisim_core::{
    ConfigError, EngineConfig, EngineError, EngineStatus, Instrument, MarketDataSource,
    PortfolioLedger, SimulationEngine, Strategy,
};

use crate::config::{BacktestConfig, ConfigFileError};
use crate::metrics::PerformanceReport;
use crate::result::BacktestResult;
use crate::strategies::{StrategyRegistry, UnknownStrategy};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigFileError),
    #[error("engine rejected config: {0}")]
    Engine(#[from] ConfigError),
    #[error(transparent)]
    UnknownStrategy(#[from] UnknownStrategy),
}

/// Build the engine for a validated config. The run window spans the
/// whole of both endpoint dates.
pub fn build_engine(config: &BacktestConfig) -> Result<SimulationEngine, RunError> {
    config.validate()?;
    let start = config
        .start_date
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();
    let end = config
        .end_date
        .and_hms_opt(23, 59, 59)
        .unwrap_or_default()
        .and_utc();
    let mut engine_config = EngineConfig::new(start, end, config.initial_capital);
    engine_config.sizing_fraction = config.sizing_fraction;
    Ok(SimulationEngine::new(engine_config))
}

/// Run one backtest with an externally built engine, so callers can
/// hold its control handle or attach a progress callback first.
///
/// Data and strategy failures mid-run come back as a `Failed` result
/// carrying the error text and whatever transactions had settled;
/// config problems fail the call itself.
pub fn run_with_engine(
    engine: &SimulationEngine,
    config: &BacktestConfig,
    strategy: &mut dyn Strategy,
    source: &mut dyn MarketDataSource,
    instruments: Vec<Instrument>,
) -> Result<BacktestResult, RunError> {
    let cost_model = config.costs.build()?;
    let mut ledger = PortfolioLedger::new(
        config.initial_capital,
        cost_model,
        config.risk_limits.clone(),
    );
    for instrument in instruments {
        ledger.register_instrument(instrument);
    }

    let run_id = config.run_id();
    info!(%run_id, strategy = strategy.name(), "backtest starting");

    let started = std::time::Instant::now();
    match engine.run(strategy, source, &mut ledger) {
        Ok(outcome) => {
            let transactions = ledger.portfolio.transactions.clone();
            let report = if outcome.equity_curve.is_empty() {
                None
            } else {
                Some(PerformanceReport::compute(
                    &outcome.equity_curve,
                    &transactions,
                    config.risk_free_rate,
                ))
            };
            Ok(BacktestResult {
                schema_version: crate::result::SCHEMA_VERSION,
                run_id,
                status: outcome.status,
                bar_count: outcome.bar_count,
                duration_ms: started.elapsed().as_millis() as u64,
                equity_curve: outcome.equity_curve,
                transactions,
                dropped_signals: outcome.dropped_signals,
                report,
                error: None,
            })
        }
        Err(EngineError::Config(err)) => Err(err.into()),
        Err(err) => {
            error!(%run_id, %err, "backtest failed mid-run");
            Ok(BacktestResult {
                schema_version: crate::result::SCHEMA_VERSION,
                run_id,
                status: EngineStatus::Failed,
                bar_count: 0,
                duration_ms: started.elapsed().as_millis() as u64,
                equity_curve: Vec::new(),
                transactions: ledger.portfolio.transactions.clone(),
                dropped_signals: Vec::new(),
                report: None,
                error: Some(err.to_string()),
            })
        }
    }
}

/// Run one backtest, building the strategy from the config through the
/// registry.
pub fn run_backtest(
    registry: &StrategyRegistry,
    config: &BacktestConfig,
    source: &mut dyn MarketDataSource,
) -> Result<BacktestResult, RunError> {
    let engine = build_engine(config)?;
    let mut strategy = registry.build(&config.strategy)?;
    run_with_engine(&engine, config, strategy.as_mut(), source, Vec::new())
}
