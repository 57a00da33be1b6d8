//! EquiSim Runner — backtest orchestration on top of `equisim-core`.
//!
//! This crate builds on the core engine to provide:
//! - TOML run configuration with content-addressed run ids
//! - The strategy registry and the built-in strategies
//! - Single-backtest orchestration and performance reporting
//! - CSV bar loading and synthetic bar generation
//! - Artifact export (JSON result, trade tape, equity curve)
//! - Parallel parameter sweeps

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod result;
pub mod runner;
pub mod strategies;
pub mod sweep;
pub mod synthetic;

pub use config::{BacktestConfig, ConfigFileError, CostConfig, RunId, StrategyConfig};
pub use data_loader::{load_bars_csv, read_bars, LoadError};
pub use export::{export_equity_csv, export_json, export_transactions_csv, import_json, write_artifacts};
pub use metrics::{DayReturn, DrawdownStats, PerformanceReport, TradeStats};
pub use result::{BacktestResult, SCHEMA_VERSION};
pub use runner::{build_engine, run_backtest, run_with_engine, RunError};
pub use strategies::{BollingerBands, BuyAndHold, MaCrossover, Rsi, StrategyRegistry, UnknownStrategy};
pub use sweep::{run_sweep, ParamGrid};
pub use synthetic::{generate_bars, WalkParams};
