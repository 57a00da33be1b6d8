//! Parameter sweep utilities for grid search over strategy configs.
//!
//! Each grid point gets its own engine and ledger, so runs are fully
//! independent and execute in parallel via rayon.

use rayon::prelude::*;

use equisim_core::{MarketBar, VecSource};

use crate::config::{BacktestConfig, StrategyConfig};
use crate::result::BacktestResult;
use crate::runner::{self, RunError};
use crate::strategies::StrategyRegistry;

/// MA crossover parameter grid.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub short_periods: Vec<usize>,
    pub long_periods: Vec<usize>,
}

impl ParamGrid {
    /// A sensible starting grid: short 5/10/20 against long 50/100/200.
    pub fn ma_crossover_default() -> Self {
        Self {
            short_periods: vec![5, 10, 20],
            long_periods: vec![50, 100, 200],
        }
    }

    /// All valid configurations (short >= long combinations are
    /// skipped).
    pub fn generate_configs(&self, base: &BacktestConfig) -> Vec<BacktestConfig> {
        let mut configs = Vec::new();
        for &short in &self.short_periods {
            for &long in &self.long_periods {
                if short >= long {
                    continue;
                }
                let mut config = base.clone();
                config.strategy = StrategyConfig::MaCrossover {
                    short_period: short,
                    long_period: long,
                };
                configs.push(config);
            }
        }
        configs
    }
}

/// Run every config against the same bar set, in parallel. Results come
/// back in config order regardless of scheduling.
pub fn run_sweep(
    registry: &StrategyRegistry,
    configs: &[BacktestConfig],
    bars: &[MarketBar],
) -> Vec<Result<BacktestResult, RunError>> {
    configs
        .par_iter()
        .map(|config| {
            let mut source = VecSource::new(bars.to_vec());
            runner::run_backtest(registry, config, &mut source)
        })
        .collect()
}
