//! Rolling indicators over a close-price series.
//!
//! Every indicator is a pure function of the closes: series in, series of the
//! same length out. The first `lookback()` values are `f64::NAN` (warmup).
//!
//! # Look-ahead contamination guard
//! No value at bar t may depend on a close from bar t+1 or later. The
//! truncated-vs-full test in `tests/lookahead_test.rs` checks every indicator.

pub mod bollinger;
pub mod donchian;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bollinger, BollingerBand};
pub use donchian::{Donchian, DonchianBand};
pub use rsi::Rsi;
pub use sma::Sma;

/// A rolling computation over close prices.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_200", "rsi_2").
    fn name(&self) -> &str;

    /// Number of leading bars that are NaN before the first valid value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole series.
    ///
    /// Returns a `Vec<f64>` of the same length as `closes`.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
