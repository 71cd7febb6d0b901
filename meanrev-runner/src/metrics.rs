//! Performance metrics — pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Returns are fractions (0.1 = 10%); annualization assumes 252 trading
//! days per year.

use meanrev_core::TradeRecord;
use serde::{Deserialize, Serialize};

use crate::simulate::BacktestResult;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    /// Longest stretch of bars spent below a prior equity peak.
    pub longest_drawdown_bars: usize,
    pub benchmark_return: f64,
    /// Strategy total return minus benchmark total return.
    pub excess_return: f64,
}

impl PerformanceMetrics {
    /// Compute all curve metrics from a simulated result.
    pub fn compute(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let equity = result.equity_values();
        let benchmark = result.benchmark_values();
        let total = total_return(&equity);
        let bench = total_return(&benchmark);
        Self {
            total_return: total,
            cagr: cagr(&equity, equity.len()),
            sharpe: sharpe_ratio(&equity, risk_free_rate),
            max_drawdown: max_drawdown(&equity),
            longest_drawdown_bars: longest_drawdown_duration(&equity),
            benchmark_return: bench,
            excess_return: total - bench,
        }
    }
}

// ─── Curve metrics ──────────────────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&final_eq)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (final_eq - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound Annual Growth Rate.
///
/// Returns 0.0 for single-bar curves or non-positive endpoints.
pub fn cagr(equity_curve: &[f64], trading_days: usize) -> f64 {
    if equity_curve.len() < 2 || trading_days < 2 {
        return 0.0;
    }
    let (initial, final_eq) = (equity_curve[0], equity_curve[equity_curve.len() - 1]);
    if initial <= 0.0 || final_eq <= 0.0 {
        return 0.0;
    }
    let years = trading_days as f64 / TRADING_DAYS_PER_YEAR;
    (final_eq / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio from daily returns.
///
/// Sharpe = mean(daily returns - rf/252) / std(daily returns - rf/252) * sqrt(252).
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let excess: Vec<f64> = returns.iter().map(|r| r - daily_rf).collect();
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&excess) / std) * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity never falls below a prior peak.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = match equity_curve.first() {
        Some(&first) => first,
        None => return 0.0,
    };
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Longest run of consecutive bars below the running peak.
///
/// A drawdown still open at the last bar counts up to that bar.
pub fn longest_drawdown_duration(equity_curve: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0;
    let mut longest = 0;

    for &eq in equity_curve {
        if eq >= peak {
            peak = eq;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

// ─── Trade metrics ──────────────────────────────────────────────────

/// Win rate: fraction of trades with positive profit.
pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 when there are no losses.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().map(|t| t.profit.max(0.0)).sum();
    let gross_loss: f64 = trades.iter().map(|t| (-t.profit).max(0.0)).sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

/// Distribution of profit and return over one group of trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeGroupStats {
    pub count: usize,
    pub avg_profit: f64,
    pub profit_std: f64,
    pub max_profit: f64,
    pub min_profit: f64,
    /// Per-trade returns are fractions of entry cost.
    pub avg_return: f64,
    pub return_std: f64,
    pub max_return: f64,
    pub min_return: f64,
}

impl TradeGroupStats {
    /// `None` for an empty group.
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a TradeRecord>) -> Option<Self> {
        let (profits, returns): (Vec<f64>, Vec<f64>) = trades
            .into_iter()
            .map(|t| (t.profit, t.return_pct()))
            .unzip();
        if profits.is_empty() {
            return None;
        }
        Some(Self {
            count: profits.len(),
            avg_profit: mean_f64(&profits),
            profit_std: population_std_dev(&profits),
            max_profit: max_f64(&profits),
            min_profit: min_f64(&profits),
            avg_return: mean_f64(&returns),
            return_std: population_std_dev(&returns),
            max_return: max_f64(&returns),
            min_return: min_f64(&returns),
        })
    }
}

/// Closed-trade statistics, overall and split by outcome.
///
/// Break-even trades count toward `all` but neither split group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub all: Option<TradeGroupStats>,
    pub profitable: Option<TradeGroupStats>,
    pub unprofitable: Option<TradeGroupStats>,
}

impl TradeStats {
    pub fn from_trades(trades: &[TradeRecord]) -> Self {
        Self {
            count: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            all: TradeGroupStats::from_trades(trades),
            profitable: TradeGroupStats::from_trades(trades.iter().filter(|t| t.profit > 0.0)),
            unprofitable: TradeGroupStats::from_trades(trades.iter().filter(|t| t.profit < 0.0)),
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Compute daily returns from an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Population standard deviation (n).
pub(crate) fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn max_f64(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_f64(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}
