//! Runs several configs in order and tabulates the results.
//!
//! A failing config is recorded and the batch moves on; one bad ticker or
//! one out-of-range parameter never hides the rest of the comparison.

use anyhow::{Context, Result};
use meanrev_core::StrategyConfig;

use crate::config::{BatchConfig, RunConfig};
use crate::runner::{RunError, RunReport, Runner};

/// A run that did not produce a report.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the run in the batch.
    pub index: usize,
    pub ticker: String,
    pub strategy: StrategyConfig,
    pub error: RunError,
}

/// Reports and failures of a batch, each in submission order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<RunReport>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total(&self) -> usize {
        self.reports.len() + self.failures.len()
    }

    fn record(
        &mut self,
        index: usize,
        ticker: &str,
        strategy: &StrategyConfig,
        result: Result<RunReport, RunError>,
    ) {
        match result {
            Ok(report) => self.reports.push(report),
            Err(error) => {
                log::warn!("run {} ({ticker} {strategy}) failed: {error}", index + 1);
                self.failures.push(BatchFailure {
                    index,
                    ticker: ticker.to_string(),
                    strategy: strategy.clone(),
                    error,
                });
            }
        }
    }

    fn log_finished(&self) {
        log::info!(
            "batch finished: {} succeeded, {} failed",
            self.reports.len(),
            self.failures.len()
        );
    }

    /// One row per successful run. Returns and drawdown in percent.
    pub fn comparison_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "ticker",
            "strategy",
            "params",
            "start_date",
            "end_date",
            "final_return",
            "benchmark_return",
            "excess_return",
            "annualized_return",
            "sharpe",
            "max_drawdown",
            "longest_drawdown_bars",
            "trades",
            "win_rate",
        ])?;

        for r in &self.reports {
            wtr.write_record([
                r.config.ticker.to_ascii_uppercase(),
                r.config.strategy.label().to_string(),
                r.config.strategy.params(),
                r.first_date.to_string(),
                r.last_date.to_string(),
                format!("{:.2}", r.result.final_return * 100.0),
                format!("{:.2}", r.result.benchmark_return * 100.0),
                format!("{:.2}", r.metrics.excess_return * 100.0),
                format!("{:.2}", r.metrics.cagr * 100.0),
                format!("{:.3}", r.metrics.sharpe),
                format!("{:.2}", r.metrics.max_drawdown * 100.0),
                r.metrics.longest_drawdown_bars.to_string(),
                r.trade_stats.count.to_string(),
                format!("{:.1}", r.trade_stats.win_rate * 100.0),
            ])?;
        }

        let data = wtr.into_inner().context("failed to flush CSV writer")?;
        String::from_utf8(data).context("CSV output is not valid UTF-8")
    }
}

/// Run every config in order.
pub fn run_batch(runner: &Runner, configs: &[RunConfig]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (index, config) in configs.iter().enumerate() {
        outcome.record(index, &config.ticker, &config.strategy, runner.run(config));
    }
    outcome.log_finished();
    outcome
}

/// Run every `[[run]]` of a batch file in order.
///
/// All runs are resolved and validated before the first fetch. A run that
/// fails to resolve is recorded as `InvalidConfig` and skipped.
pub fn run_batch_file(runner: &Runner, batch: &BatchConfig) -> BatchOutcome {
    let resolved = batch.resolve_runs();
    let mut outcome = BatchOutcome::default();

    for (index, (run, config)) in batch.runs.iter().zip(resolved).enumerate() {
        let result = config
            .map_err(RunError::from)
            .and_then(|config| runner.run(&config));
        outcome.record(index, &run.ticker, &run.strategy, result);
    }

    outcome.log_finished();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use meanrev_core::data::StaticProvider;
    use meanrev_core::{ConfigError, PriceSeries};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn runner() -> Runner {
        let spy = PriceSeries::from_closes("SPY", d(2024, 1, 1), &[10.0, 11.0, 12.0]).unwrap();
        let qqq = PriceSeries::from_closes("QQQ", d(2024, 1, 1), &[20.0, 18.0, 22.0]).unwrap();
        Runner::new(StaticProvider::new().with_series(spy).with_series(qqq))
    }

    fn cfg(ticker: &str) -> RunConfig {
        RunConfig::new(ticker, StrategyConfig::BuyAndHold, d(2024, 1, 1), d(2024, 1, 31))
    }

    #[test]
    fn failure_does_not_stop_batch() {
        let outcome = run_batch(&runner(), &[cfg("SPY"), cfg("MISSING"), cfg("QQQ")]);

        assert_eq!(outcome.total(), 3);
        assert!(!outcome.is_clean());
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[0].ticker(), "SPY");
        assert_eq!(outcome.reports[1].ticker(), "QQQ");

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert!(matches!(
            outcome.failures[0].error,
            RunError::DataUnavailable(_)
        ));
    }

    #[test]
    fn comparison_csv_one_row_per_success() {
        let outcome = run_batch(&runner(), &[cfg("SPY"), cfg("MISSING"), cfg("QQQ")]);
        let csv = outcome.comparison_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ticker,strategy,params,"));
        assert!(lines[1].starts_with("SPY,BuyAndHold,,2024-01-01,2024-01-03,20.00,20.00,"));
        assert!(lines[2].starts_with("QQQ,BuyAndHold,,"));
    }

    #[test]
    fn invalid_run_in_file_does_not_stop_batch() {
        let batch = BatchConfig::from_toml(
            r#"
[defaults]
start_date = "2024-01-01"

[[run]]
ticker = "SPY"
strategy = { type = "buy_and_hold" }
end_date = "2024-01-31"

[[run]]
ticker = "SPY"
strategy = { type = "bollinger", window = 20, k = -1.0 }
end_date = "2024-01-31"

[[run]]
ticker = "IWM"
strategy = { type = "buy_and_hold" }

[[run]]
ticker = "QQQ"
strategy = { type = "buy_and_hold" }
end_date = "2024-01-31"
"#,
        )
        .unwrap();

        let outcome = run_batch_file(&runner(), &batch);

        assert_eq!(outcome.total(), 4);
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[0].ticker(), "SPY");
        assert_eq!(outcome.reports[1].ticker(), "QQQ");

        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].index, 1);
        assert!(matches!(
            outcome.failures[0].error,
            RunError::InvalidConfig(ConfigError::InvalidStrategyConfig { .. })
        ));
        assert_eq!(outcome.failures[1].index, 2);
        assert_eq!(outcome.failures[1].ticker, "IWM");
        assert!(matches!(
            outcome.failures[1].error,
            RunError::InvalidConfig(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn empty_batch() {
        let outcome = run_batch(&runner(), &[]);
        assert!(outcome.is_clean());
        assert_eq!(outcome.comparison_csv().unwrap().lines().count(), 1);
    }
}
