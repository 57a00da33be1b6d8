//! Performance metrics — pure functions that compute run statistics.
//!
//! Every metric is a pure function: equity curve and/or transaction
//! list in, scalar out. Ratios whose denominator vanishes (zero
//! variance, no downside, no losses, zero drawdown) are `None` rather
//! than a sentinel value.
//!
//! Equity arrives as decimals from the ledger; statistics are computed
//! in f64, which is where exactness stops mattering.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use equisim_core::{EquityPoint, Transaction};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance report for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub total_return: f64,
    pub annualized_return: f64,
    /// Annualized standard deviation of per-bar returns.
    pub volatility: f64,
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub calmar: Option<f64>,
    pub drawdown: DrawdownStats,
    pub var_95: Option<f64>,
    pub var_99: Option<f64>,
    pub cvar_95: Option<f64>,
    pub cvar_99: Option<f64>,
    pub trades: TradeStats,
    pub best_day: Option<DayReturn>,
    pub worst_day: Option<DayReturn>,
    /// Returns dropped because the prior equity was non-positive.
    pub excluded_returns: usize,
}

/// Drawdown summary over the full equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownStats {
    /// Deepest peak-to-trough move as a negative fraction
    /// (-0.15 = 15% drawdown). Zero when equity never declines.
    pub max_drawdown: f64,
    /// Length in bars of the longest peak-to-recovery stretch.
    pub longest_duration: usize,
    /// Whether the deepest drawdown recovered to its peak before the
    /// run ended.
    pub recovered: bool,
}

/// Statistics over closed trades (sell transactions with realized P&L).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeStats {
    pub count: usize,
    pub win_rate: f64,
    /// Gross profits / gross losses; `None` when there are no losses.
    pub profit_factor: Option<f64>,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    /// Expected P&L per trade: win_rate * avg_win - loss_rate * |avg_loss|.
    pub expectancy: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

/// One day's return, kept for best/worst-day reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReturn {
    pub date: NaiveDate,
    pub value: f64,
}

impl PerformanceReport {
    /// Compute all metrics from the equity curve and the trade log.
    pub fn compute(
        equity_curve: &[EquityPoint],
        transactions: &[Transaction],
        risk_free_rate: f64,
    ) -> Self {
        let equity: Vec<f64> = equity_curve
            .iter()
            .map(|p| p.value.to_f64().unwrap_or(0.0))
            .collect();
        let (returns, excluded) = bar_returns(&equity);
        let bars = equity.len();

        let realized: Vec<f64> = transactions
            .iter()
            .filter_map(|t| t.realized_pnl)
            .filter_map(|p| p.to_f64())
            .collect();

        let (best_day, worst_day) = best_and_worst_day(equity_curve, &equity);
        let drawdown = drawdown_stats(&equity);

        Self {
            total_return: total_return(&equity),
            annualized_return: annualized_return(&equity, bars),
            volatility: std_dev(&returns) * TRADING_DAYS_PER_YEAR.sqrt(),
            sharpe: sharpe_ratio(&returns, risk_free_rate),
            sortino: sortino_ratio(&returns, risk_free_rate),
            calmar: calmar_ratio(&equity, bars, &drawdown),
            var_95: value_at_risk(&returns, 0.95),
            var_99: value_at_risk(&returns, 0.99),
            cvar_95: conditional_var(&returns, 0.95),
            cvar_99: conditional_var(&returns, 0.99),
            trades: TradeStats::from_pnls(&realized),
            best_day,
            worst_day,
            excluded_returns: excluded,
            drawdown,
        }
    }
}

impl TradeStats {
    pub fn from_pnls(pnls: &[f64]) -> Self {
        let count = pnls.len();
        let wins: Vec<f64> = pnls.iter().copied().filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = pnls.iter().copied().filter(|&p| p < 0.0).collect();

        let win_rate = if count == 0 {
            0.0
        } else {
            wins.len() as f64 / count as f64
        };
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();
        let profit_factor = if count == 0 {
            None
        } else if gross_loss == 0.0 {
            None
        } else {
            Some(gross_profit / gross_loss)
        };
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);
        let loss_rate = if count == 0 {
            0.0
        } else {
            losses.len() as f64 / count as f64
        };

        Self {
            count,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win: wins.iter().copied().fold(0.0, f64::max),
            largest_loss: losses.iter().copied().fold(0.0, f64::min),
            expectancy: win_rate * avg_win - loss_rate * avg_loss.abs(),
            max_consecutive_wins: max_consecutive(pnls, true),
            max_consecutive_losses: max_consecutive(pnls, false),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Per-bar simple returns. Bars whose prior equity is non-positive are
/// skipped; the second element counts how many were dropped.
pub fn bar_returns(equity: &[f64]) -> (Vec<f64>, usize) {
    let mut returns = Vec::with_capacity(equity.len().saturating_sub(1));
    let mut excluded = 0;
    for w in equity.windows(2) {
        if w[0] > 0.0 {
            returns.push((w[1] - w[0]) / w[0]);
        } else {
            excluded += 1;
        }
    }
    (returns, excluded)
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&initial), Some(&last)) if initial > 0.0 => (last - initial) / initial,
        _ => 0.0,
    }
}

/// Compound annual growth rate, assuming 252 trading bars per year.
pub fn annualized_return(equity: &[f64], bars: usize) -> f64 {
    if equity.len() < 2 || bars < 2 {
        return 0.0;
    }
    let initial = equity[0];
    let last = equity[equity.len() - 1];
    if initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = bars as f64 / TRADING_DAYS_PER_YEAR;
    (last / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio. `None` when the return variance is zero or
/// there are fewer than two returns.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return None;
    }
    Some(mean(&excess) / std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Annualized Sortino ratio, using downside deviation over the full
/// return count. `None` when no return falls below the target.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let downside_sq: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    if downside_sq == 0.0 {
        return None;
    }
    let downside_std = (downside_sq / returns.len() as f64).sqrt();
    Some(mean(&excess) / downside_std * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Calmar ratio: annualized return / |max drawdown|. `None` when the
/// curve never drew down.
pub fn calmar_ratio(equity: &[f64], bars: usize, drawdown: &DrawdownStats) -> Option<f64> {
    if drawdown.max_drawdown == 0.0 {
        return None;
    }
    Some(annualized_return(equity, bars) / drawdown.max_drawdown.abs())
}

/// Max drawdown, longest underwater stretch, and recovery flag.
pub fn drawdown_stats(equity: &[f64]) -> DrawdownStats {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    let mut deepest_recovered = true;
    let mut in_deepest = false;

    let mut longest = 0usize;
    let mut underwater = 0usize;

    for &value in equity {
        if value >= peak {
            peak = value;
            if in_deepest {
                deepest_recovered = true;
                in_deepest = false;
            }
            longest = longest.max(underwater);
            underwater = 0;
            continue;
        }
        underwater += 1;
        if peak > 0.0 {
            let dd = (value - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
                deepest_recovered = false;
                in_deepest = true;
            }
        }
    }
    longest = longest.max(underwater);

    DrawdownStats {
        max_drawdown: max_dd,
        longest_duration: longest,
        recovered: max_dd == 0.0 || deepest_recovered,
    }
}

/// Historical value-at-risk at the given confidence, with linear
/// interpolation between order statistics. `None` on an empty series.
///
/// The rank is `(1 - confidence) * (n - 1)` over the ascending-sorted
/// returns; fractional ranks interpolate between neighbors.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (1.0 - confidence) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

/// Expected shortfall: mean of the tail at or beyond the VaR rank.
pub fn conditional_var(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (1.0 - confidence) * (sorted.len() - 1) as f64;
    let tail = &sorted[..=rank.floor() as usize];
    Some(mean(tail))
}

fn best_and_worst_day(
    curve: &[EquityPoint],
    equity: &[f64],
) -> (Option<DayReturn>, Option<DayReturn>) {
    let mut best: Option<DayReturn> = None;
    let mut worst: Option<DayReturn> = None;
    for (i, w) in equity.windows(2).enumerate() {
        if w[0] <= 0.0 {
            continue;
        }
        let value = (w[1] - w[0]) / w[0];
        let date = curve[i + 1].timestamp.date_naive();
        if best.as_ref().map_or(true, |b| value > b.value) {
            best = Some(DayReturn { date, value });
        }
        if worst.as_ref().map_or(true, |w| value < w.value) {
            worst = Some(DayReturn { date, value });
        }
    }
    (best, worst)
}

// ─── Helpers ────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn max_consecutive(pnls: &[f64], winners: bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for &pnl in pnls {
        if (pnl > 0.0) == winners && pnl != 0.0 {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn curve(values: &[i64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::days(i as i64),
                value: Decimal::from(v),
            })
            .collect()
    }

    #[test]
    fn total_return_basic() {
        assert_eq!(total_return(&[100.0, 110.0]), 0.1);
        assert_eq!(total_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn flat_curve_has_undefined_sharpe() {
        let returns = vec![0.0, 0.0, 0.0];
        assert_eq!(sharpe_ratio(&returns, 0.0), None);
    }

    #[test]
    fn all_gains_have_undefined_sortino() {
        let returns = vec![0.01, 0.02, 0.01];
        assert_eq!(sortino_ratio(&returns, 0.0), None);
        assert!(sharpe_ratio(&returns, 0.0).is_some());
    }

    #[test]
    fn drawdown_depth_duration_and_recovery() {
        let stats = drawdown_stats(&[100.0, 120.0, 90.0, 95.0, 125.0, 110.0]);
        // deepest move: 120 -> 90 = -25%, recovered at 125
        assert!((stats.max_drawdown - (-0.25)).abs() < 1e-12);
        assert!(stats.recovered);
        assert_eq!(stats.longest_duration, 2);

        let open_ended = drawdown_stats(&[100.0, 120.0, 90.0, 95.0]);
        assert!(!open_ended.recovered);
        assert_eq!(open_ended.longest_duration, 2);
    }

    #[test]
    fn flat_curve_has_no_drawdown() {
        let stats = drawdown_stats(&[100.0, 100.0, 100.0]);
        assert_eq!(stats.max_drawdown, 0.0);
        assert!(stats.recovered);
        assert_eq!(stats.longest_duration, 0);
    }

    #[test]
    fn var_interpolates_between_order_statistics() {
        let returns = vec![-0.05, -0.03, -0.01, 0.0, 0.02, 0.04];
        // rank = 0.05 * 5 = 0.25 -> between -0.05 and -0.03
        let var = value_at_risk(&returns, 0.95).unwrap();
        assert!((var - (-0.045)).abs() < 1e-12);
        let cvar = conditional_var(&returns, 0.95).unwrap();
        assert!((cvar - (-0.05)).abs() < 1e-12);
    }

    #[test]
    fn var_on_empty_series_is_undefined() {
        assert_eq!(value_at_risk(&[], 0.95), None);
        assert_eq!(conditional_var(&[], 0.95), None);
    }

    #[test]
    fn trade_stats_without_losses() {
        let stats = TradeStats::from_pnls(&[100.0, 50.0, 200.0]);
        assert_eq!(stats.count, 3);
        assert_eq!(stats.win_rate, 1.0);
        assert_eq!(stats.profit_factor, None);
        assert_eq!(stats.largest_win, 200.0);
        assert_eq!(stats.max_consecutive_wins, 3);
        assert_eq!(stats.max_consecutive_losses, 0);
    }

    #[test]
    fn trade_stats_mixed() {
        let stats = TradeStats::from_pnls(&[100.0, -50.0, -30.0, 60.0]);
        assert_eq!(stats.win_rate, 0.5);
        assert_eq!(stats.profit_factor, Some(2.0));
        assert_eq!(stats.avg_win, 80.0);
        assert_eq!(stats.avg_loss, -40.0);
        assert_eq!(stats.largest_loss, -50.0);
        assert_eq!(stats.max_consecutive_losses, 2);
        // 0.5 * 80 - 0.5 * 40 = 20
        assert!((stats.expectancy - 20.0).abs() < 1e-12);
    }

    #[test]
    fn zero_equity_points_are_excluded_from_returns() {
        let (returns, excluded) = bar_returns(&[100.0, 0.0, 50.0, 55.0]);
        assert_eq!(excluded, 1);
        assert_eq!(returns.len(), 2);
    }

    #[test]
    fn report_on_trending_curve() {
        let points = curve(&[1000, 1010, 1005, 1030, 1025, 1050]);
        let report = PerformanceReport::compute(&points, &[], 0.0);
        assert!((report.total_return - 0.05).abs() < 1e-12);
        assert!(report.sharpe.is_some());
        assert!(report.calmar.is_some());
        assert!(report.drawdown.max_drawdown < 0.0);
        assert_eq!(report.excluded_returns, 0);
        assert_eq!(report.best_day.as_ref().map(|d| d.value > 0.0), Some(true));
        assert_eq!(report.worst_day.as_ref().map(|d| d.value < 0.0), Some(true));
    }
}
