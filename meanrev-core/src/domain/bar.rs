//! PriceBar — one trading day of OHLCV data for a single ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar. Immutable once fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// A bar whose close is usable for evaluation and simulation.
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    ///
    /// Providers occasionally ship bars that fail this (bad prints); they are
    /// kept, since only the close drives signals, but callers can flag them.
    pub fn is_sane(&self) -> bool {
        if !self.has_valid_close() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
    }
}
