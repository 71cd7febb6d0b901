//! Wires together data, evaluation, simulation and metrics for one backtest.
//!
//! Control flow per run is linear: validate → fetch → check history →
//! fetch the strategy's second series, if it names one → evaluate →
//! simulate → metrics. Nothing is retried.

use chrono::NaiveDate;
use thiserror::Error;

use meanrev_core::{evaluate_with, ConfigError, DataError, DataProvider, SignalSequence};

use crate::config::{RunConfig, RunId};
use crate::metrics::{PerformanceMetrics, TradeStats};
use crate::simulate::{simulate, BacktestResult};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] DataError),

    #[error("insufficient history: strategy needs {required} bars, series has {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("signal count {signals} does not match bar count {bars}")]
    SignalLengthMismatch { signals: usize, bars: usize },
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub config: RunConfig,
    /// First and last bar actually fetched.
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub bar_count: usize,
    pub signals: SignalSequence,
    pub result: BacktestResult,
    pub metrics: PerformanceMetrics,
    pub trade_stats: TradeStats,
}

impl RunReport {
    pub fn ticker(&self) -> &str {
        &self.config.ticker
    }

    /// Bars before the strategy can emit its first signal.
    pub fn warmup_bars(&self) -> usize {
        self.config.strategy.warmup_bars().saturating_sub(1)
    }
}

/// Runs backtests against one data provider.
pub struct Runner {
    provider: Box<dyn DataProvider>,
}

impl Runner {
    pub fn new(provider: impl DataProvider + 'static) -> Self {
        Self::from_boxed(Box::new(provider))
    }

    pub fn from_boxed(provider: Box<dyn DataProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run a single backtest.
    ///
    /// The config is validated before the provider is called, so a bad
    /// strategy never costs a network round trip.
    pub fn run(&self, config: &RunConfig) -> Result<RunReport, RunError> {
        config.validate()?;

        log::debug!(
            "fetching {} {}..{} from {}",
            config.ticker,
            config.start_date,
            config.end_date,
            self.provider.name()
        );
        let series = self
            .provider
            .fetch(&config.ticker, config.start_date, config.end_date)?;

        let required = config.strategy.warmup_bars();
        let available = series.len();
        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => {
                return Err(RunError::InsufficientHistory {
                    required,
                    available,
                })
            }
        };
        if available < required {
            if config.require_full_history {
                return Err(RunError::InsufficientHistory {
                    required,
                    available,
                });
            }
            log::warn!(
                "{}: {available} bars is shorter than the {required}-bar warmup of {}; every signal will be HOLD",
                config.ticker,
                config.strategy
            );
        }

        let aux = match config.strategy.auxiliary_symbol() {
            Some(symbol) => {
                log::debug!("fetching {symbol} for {}", config.strategy.name());
                Some(
                    self.provider
                        .fetch(symbol, config.start_date, config.end_date)?,
                )
            }
            None => None,
        };

        let signals = evaluate_with(&series, aux.as_ref(), &config.strategy);
        let result = simulate(&series, &signals, config.initial_capital)?;
        let metrics = PerformanceMetrics::compute(&result, config.risk_free_rate);
        let trade_stats = TradeStats::from_trades(&result.trades);

        log::info!(
            "{} {}: return {:.2}% vs buy-and-hold {:.2}% over {available} bars, {} trades",
            config.ticker,
            config.strategy,
            result.final_return * 100.0,
            result.benchmark_return * 100.0,
            trade_stats.count
        );

        Ok(RunReport {
            run_id: config.run_id(),
            config: config.clone(),
            first_date: first,
            last_date: last,
            bar_count: available,
            signals,
            result,
            metrics,
            trade_stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meanrev_core::data::{StaticProvider, SyntheticProvider};
    use meanrev_core::{MaSchedule, PriceSeries, Signal, StrategyConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Provider that counts calls and delegates to a static map.
    struct CountingProvider {
        inner: StaticProvider,
        calls: Arc<AtomicUsize>,
    }

    impl DataProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<PriceSeries, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(symbol, start, end)
        }
    }

    fn counting_runner(closes: &[f64]) -> (Runner, Arc<AtomicUsize>) {
        let series = PriceSeries::from_closes("TST", d(2024, 1, 1), closes).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            inner: StaticProvider::new().with_series(series),
            calls: Arc::clone(&calls),
        };
        (Runner::new(provider), calls)
    }

    fn config(strategy: StrategyConfig) -> RunConfig {
        RunConfig::new("TST", strategy, d(2024, 1, 1), d(2024, 12, 31))
    }

    #[test]
    fn invalid_strategy_fails_before_fetch() {
        let (runner, calls) = counting_runner(&[10.0, 11.0]);
        let err = runner
            .run(&config(StrategyConfig::Bollinger { window: 0, k: 2.0 }))
            .unwrap_err();

        assert!(matches!(
            err,
            RunError::InvalidConfig(ConfigError::InvalidStrategyConfig { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn invalid_capital_fails_before_fetch() {
        let (runner, calls) = counting_runner(&[10.0, 11.0]);
        let err = runner
            .run(&config(StrategyConfig::BuyAndHold).with_capital(-1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidConfig(ConfigError::InvalidCapital(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_symbol_is_data_unavailable() {
        let (runner, _) = counting_runner(&[10.0]);
        let mut cfg = config(StrategyConfig::BuyAndHold);
        cfg.ticker = "NOPE".into();
        assert!(matches!(
            runner.run(&cfg).unwrap_err(),
            RunError::DataUnavailable(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn short_history_aborts_by_default() {
        let (runner, _) = counting_runner(&[10.0; 20]);
        let ma = StrategyConfig::MovingAverage {
            period: 50,
            schedule: MaSchedule::Daily,
        };
        let err = runner.run(&config(ma)).unwrap_err();
        assert!(matches!(
            err,
            RunError::InsufficientHistory {
                required: 50,
                available: 20
            }
        ));
    }

    #[test]
    fn short_history_allowed_is_all_hold() {
        let (runner, _) = counting_runner(&[10.0; 20]);
        let ma = StrategyConfig::MovingAverage {
            period: 50,
            schedule: MaSchedule::Daily,
        };
        let report = runner.run(&config(ma).with_full_history(false)).unwrap();
        assert_eq!(report.bar_count, 20);
        assert!(report.signals.iter().all(|s| s == Signal::Hold));
        assert!(report.result.trades.is_empty());
        assert_eq!(report.result.final_return, 0.0);
    }

    #[test]
    fn buy_and_hold_matches_benchmark() {
        let (runner, calls) = counting_runner(&[10.0, 12.0, 9.0, 14.0]);
        let report = runner.run(&config(StrategyConfig::BuyAndHold)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.signals.buy_count(), 1);
        assert!((report.result.final_return - 0.4).abs() < 1e-12);
        assert!((report.result.benchmark_return - 0.4).abs() < 1e-12);
        assert!(report.metrics.excess_return.abs() < 1e-12);
        assert!(report.result.open_position.is_some());
        assert_eq!(report.first_date, d(2024, 1, 1));
        assert_eq!(report.warmup_bars(), 0);
    }

    #[test]
    fn volatility_strategy_fetches_its_index() {
        let (runner, calls) = counting_runner(&[10.0; 30]);
        let vix = StrategyConfig::VixMa {
            vix_symbol: "^VIX".into(),
            vix_period: 5,
            spike: 0.05,
            trend_period: 10,
        };
        let err = runner.run(&config(vix)).unwrap_err();

        // Instrument found, index missing
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err,
            RunError::DataUnavailable(DataError::SymbolNotFound { ref symbol }) if symbol == "^VIX"
        ));
    }

    #[test]
    fn volatility_strategy_runs_with_both_series() {
        let runner = Runner::new(SyntheticProvider::new(5));
        let cfg = RunConfig::new("SPY", "vix_ma".parse().unwrap(), d(2019, 1, 1), d(2022, 12, 31));
        let report = runner.run(&cfg).unwrap();

        assert_eq!(report.signals.len(), report.bar_count);
        assert!(report.signals.sell_count() > 0);
    }

    #[test]
    fn synthetic_run_is_deterministic() {
        let runner = Runner::new(SyntheticProvider::new(3));
        let cfg = RunConfig::new(
            "SPY",
            "double_seven".parse().unwrap(),
            d(2020, 1, 1),
            d(2021, 12, 31),
        );
        let a = runner.run(&cfg).unwrap();
        let b = runner.run(&cfg).unwrap();

        assert_eq!(a.result, b.result);
        assert_eq!(a.run_id, b.run_id);
        assert_eq!(a.result.equity_curve.len(), a.bar_count);
        assert_eq!(a.result.benchmark_curve.len(), a.bar_count);
    }
}
