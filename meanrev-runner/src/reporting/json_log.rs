//! Per-run JSON logs named `{Strategy}_{TICKER}_({start}-{end}).json`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::metrics::{TradeGroupStats, TradeStats};
use crate::runner::RunReport;

/// Trade group summary as written to the log. Returns in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeGroupLog {
    pub number_of_trades: usize,
    pub avg_profit: f64,
    pub profit_std: f64,
    pub max_profit: f64,
    pub min_profit: f64,
    pub avg_return_pct: f64,
    pub return_std_pct: f64,
    pub max_return_pct: f64,
    pub min_return_pct: f64,
}

impl From<&TradeGroupStats> for TradeGroupLog {
    fn from(g: &TradeGroupStats) -> Self {
        Self {
            number_of_trades: g.count,
            avg_profit: g.avg_profit,
            profit_std: g.profit_std,
            max_profit: g.max_profit,
            min_profit: g.min_profit,
            avg_return_pct: g.avg_return * 100.0,
            return_std_pct: g.return_std * 100.0,
            max_return_pct: g.max_return * 100.0,
            min_return_pct: g.min_return * 100.0,
        }
    }
}

/// Nested trade statistics, present only when at least one trade closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStatsLog {
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub all_trades: TradeGroupLog,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profitable_trades: Option<TradeGroupLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unprofitable_trades: Option<TradeGroupLog>,
}

impl TradeStatsLog {
    fn from_stats(stats: &TradeStats) -> Option<Self> {
        let all = stats.all.as_ref()?;
        Some(Self {
            win_rate_pct: stats.win_rate * 100.0,
            profit_factor: stats.profit_factor,
            all_trades: all.into(),
            profitable_trades: stats.profitable.as_ref().map(Into::into),
            unprofitable_trades: stats.unprofitable.as_ref().map(Into::into),
        })
    }
}

/// One JSON run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRunLog {
    pub run_id: String,
    pub strategy: String,
    pub params: String,
    pub instrument: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub run_date: NaiveDate,
    pub initial_capital: f64,
    pub final_portfolio_value: f64,
    pub cumulative_return_pct: f64,
    pub benchmark_return_pct: f64,
    pub annualized_return_pct: f64,
    pub sharpe_ratio: f64,
    pub risk_free_rate: f64,
    pub max_drawdown_pct: f64,
    pub longest_drawdown_bars: usize,
    pub total_trades: usize,
    pub open_position: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_stats: Option<TradeStatsLog>,
}

impl JsonRunLog {
    /// `run_date` is the day the log is written, not a bar date.
    pub fn from_report(report: &RunReport, run_date: NaiveDate) -> Self {
        let config = &report.config;
        Self {
            run_id: report.run_id.clone(),
            strategy: config.strategy.label().to_string(),
            params: config.strategy.params(),
            instrument: config.ticker.to_ascii_uppercase(),
            start_date: config.start_date,
            end_date: config.end_date,
            run_date,
            initial_capital: config.initial_capital,
            final_portfolio_value: report.result.final_value(),
            cumulative_return_pct: report.result.final_return * 100.0,
            benchmark_return_pct: report.result.benchmark_return * 100.0,
            annualized_return_pct: report.metrics.cagr * 100.0,
            sharpe_ratio: report.metrics.sharpe,
            risk_free_rate: config.risk_free_rate,
            max_drawdown_pct: report.metrics.max_drawdown * 100.0,
            longest_drawdown_bars: report.metrics.longest_drawdown_bars,
            total_trades: report.trade_stats.count,
            open_position: report.result.open_position.is_some(),
            trade_stats: TradeStatsLog::from_stats(&report.trade_stats),
        }
    }

    pub fn file_name(&self) -> String {
        json_log_name(
            &self.strategy,
            &self.params,
            &self.instrument,
            self.start_date,
            self.end_date,
        )
    }
}

/// `{Strategy}_{TICKER}_({start}-{end})_{params}.json`
///
/// The parameter tag keeps variants of one strategy apart and is left out
/// when the strategy has no parameters.
pub fn json_log_name(
    strategy: &str,
    params: &str,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let tag = params_tag(params);
    let ticker = ticker.to_ascii_uppercase();
    if tag.is_empty() {
        format!("{strategy}_{ticker}_({start}-{end}).json")
    } else {
        format!("{strategy}_{ticker}_({start}-{end})_{tag}.json")
    }
}

/// `period=200 schedule=daily` → `period-200_schedule-daily`.
fn params_tag(params: &str) -> String {
    params
        .chars()
        .filter_map(|c| match c {
            '=' => Some('-'),
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect()
}

/// Write `log` under `dir`, replacing an earlier log for the same run.
pub fn write_json_log(dir: &Path, log: &JsonRunLog) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir {}", dir.display()))?;
    let path = dir.join(log.file_name());
    let json = serde_json::to_string_pretty(log).context("failed to serialize run log")?;
    fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(path)
}

pub fn read_json_log(path: &Path) -> Result<JsonRunLog> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("malformed run log {}", path.display()))
}
