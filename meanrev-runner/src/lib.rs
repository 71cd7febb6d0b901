//! MeanRev Runner — backtest simulation, metrics, batch comparison and reporting.
//!
//! This crate builds on `meanrev-core` to provide:
//! - All-or-nothing long-only simulation of a signal sequence
//! - Performance and trade statistics
//! - Single-run orchestration over an injected data provider
//! - Batch comparison from TOML files
//! - Run log records, JSON run logs, log comparison tables and charts

pub mod batch;
pub mod config;
pub mod metrics;
pub mod reporting;
pub mod runner;
pub mod simulate;

pub use batch::{run_batch, run_batch_file, BatchFailure, BatchOutcome};
pub use config::{BatchConfig, RunConfig, RunId};
pub use metrics::{PerformanceMetrics, TradeGroupStats, TradeStats};
pub use runner::{RunError, RunReport, Runner};
pub use simulate::{simulate, BacktestResult, EquityPoint};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn results_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
        assert_send::<TradeStats>();
        assert_sync::<TradeStats>();
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<BatchConfig>();
        assert_sync::<BatchConfig>();
    }

    #[test]
    fn runner_is_send_sync() {
        assert_send::<Runner>();
        assert_sync::<Runner>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
    }
}
