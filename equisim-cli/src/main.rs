//! EquiSim CLI — run backtests and generate demo data.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config against a CSV bar
//!   file or seeded synthetic data, print the report, and optionally
//!   write artifacts
//! - `synth` — generate a synthetic bar CSV for experimentation

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use equisim_core::{EngineStatus, VecSource};
use equisim_runner::{
    build_engine, generate_bars, load_bars_csv, run_with_engine, write_artifacts, BacktestConfig,
    BacktestResult, StrategyRegistry, WalkParams,
};

#[derive(Parser)]
#[command(name = "equisim", about = "EquiSim — event-driven equity backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV file of bars (symbol, timestamp, OHLC, volume).
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Generate seeded synthetic bars instead of loading a file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Seed for synthetic data.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Symbols for synthetic data, as SYMBOL=START_PRICE pairs.
        #[arg(long, default_value = "005930=70000")]
        universe: String,

        /// Output directory for artifacts (omit to skip writing).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a synthetic bar CSV.
    Synth {
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Symbols as SYMBOL=START_PRICE pairs, comma separated.
        #[arg(long, default_value = "005930=70000,000660=100000")]
        universe: String,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output CSV path.
        #[arg(long, default_value = "bars.csv")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            bars,
            synthetic,
            seed,
            universe,
            out,
        } => cmd_run(config, bars, synthetic, seed, &universe, out),
        Commands::Synth {
            start,
            end,
            universe,
            seed,
            out,
        } => cmd_synth(&start, &end, &universe, seed, out),
    }
}

fn cmd_run(
    config_path: PathBuf,
    bars_path: Option<PathBuf>,
    synthetic: bool,
    seed: u64,
    universe: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    if bars_path.is_some() && synthetic {
        bail!("--bars and --synthetic are mutually exclusive");
    }

    let text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config = BacktestConfig::from_toml(&text)?;

    let bars = match bars_path {
        Some(path) => load_bars_csv(&path)?,
        None if synthetic => generate_bars(
            &parse_universe(universe)?,
            config.start_date,
            config.end_date,
            seed,
        ),
        None => bail!("one of --bars or --synthetic is required"),
    };
    if bars.is_empty() {
        bail!("no bars to run against");
    }

    let registry = StrategyRegistry::new();
    let mut strategy = registry.build(&config.strategy)?;
    let engine = build_engine(&config)?.with_progress(|progress| {
        if let Some(fraction) = progress.fraction() {
            tracing::debug!(processed = progress.processed, "progress {:.0}%", fraction * 100.0);
        }
    });
    let mut source = VecSource::new(bars);
    let result = run_with_engine(&engine, &config, strategy.as_mut(), &mut source, Vec::new())?;

    print_summary(&result);
    if let Some(dir) = out {
        write_artifacts(&result, &dir)?;
        println!("artifacts written to {}", dir.display());
    }

    if result.status == EngineStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_synth(start: &str, end: &str, universe: &str, seed: u64, out: PathBuf) -> Result<()> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")?;
    if start >= end {
        bail!("start must be before end");
    }

    let bars = generate_bars(&parse_universe(universe)?, start, end, seed);

    let mut csv = String::from("symbol,timestamp,open,high,low,close,volume\n");
    for bar in &bars {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            bar.symbol,
            bar.timestamp.to_rfc3339(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    std::fs::write(&out, csv).with_context(|| format!("failed to write {}", out.display()))?;
    println!("{} bars written to {}", bars.len(), out.display());
    Ok(())
}

/// Parse "SYMBOL=PRICE,SYMBOL=PRICE" into walk parameters.
fn parse_universe(universe: &str) -> Result<Vec<WalkParams>> {
    universe
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (symbol, price) = entry
                .trim()
                .split_once('=')
                .with_context(|| format!("expected SYMBOL=PRICE, got '{entry}'"))?;
            let price = Decimal::from_str(price)
                .with_context(|| format!("bad price in '{entry}'"))?;
            Ok(WalkParams::new(symbol, price))
        })
        .collect()
}

fn print_summary(result: &BacktestResult) {
    println!("run      {}", &result.run_id[..result.run_id.len().min(12)]);
    println!("status   {:?}", result.status);
    println!("bars     {}", result.bar_count);
    println!("trades   {}", result.transactions.len());
    if !result.dropped_signals.is_empty() {
        println!("dropped  {}", result.dropped_signals.len());
    }
    if let Some(error) = &result.error {
        println!("error    {error}");
    }

    let Some(report) = &result.report else {
        return;
    };
    println!();
    println!("total return       {:>10.4}%", report.total_return * 100.0);
    println!("annualized return  {:>10.4}%", report.annualized_return * 100.0);
    println!("volatility         {:>10.4}%", report.volatility * 100.0);
    println!("sharpe             {}", fmt_ratio(report.sharpe));
    println!("sortino            {}", fmt_ratio(report.sortino));
    println!("calmar             {}", fmt_ratio(report.calmar));
    println!(
        "max drawdown       {:>10.4}% ({} bars, {})",
        report.drawdown.max_drawdown * 100.0,
        report.drawdown.longest_duration,
        if report.drawdown.recovered { "recovered" } else { "open" }
    );
    println!("VaR 95 / 99        {} / {}", fmt_ratio(report.var_95), fmt_ratio(report.var_99));
    println!("CVaR 95 / 99       {} / {}", fmt_ratio(report.cvar_95), fmt_ratio(report.cvar_99));
    println!(
        "trades             {} ({:.1}% win, expectancy {:.2})",
        report.trades.count,
        report.trades.win_rate * 100.0,
        report.trades.expectancy
    );

    if let (Some(best), Some(worst)) = (&report.best_day, &report.worst_day) {
        println!(
            "best / worst day   {:+.4}% ({}) / {:+.4}% ({})",
            best.value * 100.0,
            best.date,
            worst.value * 100.0,
            worst.date
        );
    }
}

fn fmt_ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_parsing() {
        let walks = parse_universe("005930=70000,000660=100000").unwrap();
        assert_eq!(walks.len(), 2);
        assert_eq!(walks[0].symbol, "005930");
        assert!(parse_universe("no-equals-sign").is_err());
    }
}
