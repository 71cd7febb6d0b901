//! Offline providers: a seeded random walk and a fixed in-memory map.
//!
//! `SyntheticProvider` lets the CLI run end to end without a network
//! (`--synthetic`). The seed is derived from the symbol with BLAKE3, so the
//! same symbol and range always produce the same series.

use super::provider::{non_empty, DataError, DataProvider};
use crate::domain::{PriceBar, PriceSeries};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Geometric random walk over weekdays.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    seed: u64,
    start_price: f64,
    /// Daily drift of log returns.
    drift: f64,
    /// Daily volatility of log returns.
    volatility: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            seed: 0,
            start_price: 100.0,
            drift: 0.0003,
            volatility: 0.012,
        }
    }
}

impl SyntheticProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_walk(mut self, start_price: f64, drift: f64, volatility: f64) -> Self {
        self.start_price = start_price;
        self.drift = drift;
        self.volatility = volatility;
        self
    }

    /// Per-symbol seed, independent of the order symbols are requested in.
    fn symbol_seed(&self, symbol: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(symbol.to_ascii_uppercase().as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    fn walk(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let mut rng = StdRng::seed_from_u64(self.symbol_seed(symbol));
        let mut bars = Vec::new();
        let mut close = self.start_price;
        let mut date = start;

        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                // Box-Muller transform for a standard normal draw
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();

                let open = close;
                close = open * (self.drift + self.volatility * z).exp();
                let wick = open.max(close) * self.volatility * rng.gen::<f64>() * 0.5;

                bars.push(PriceBar {
                    date,
                    open,
                    high: open.max(close) + wick,
                    low: (open.min(close) - wick).max(f64::MIN_POSITIVE),
                    close,
                    volume: rng.gen_range(100_000..5_000_000),
                });
            }
            date += Duration::days(1);
        }

        bars
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let series = PriceSeries::new(symbol, self.walk(symbol, start, end))?;
        log::debug!("generated {} synthetic bars for {symbol}", series.len());
        non_empty(series, start, end)
    }
}

/// Fixed series keyed by upper-case symbol. Unknown symbols are not found.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    series: HashMap<String, PriceSeries>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series
            .insert(series.ticker().to_ascii_uppercase(), series);
    }
}

impl DataProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let series = self
            .series
            .get(&symbol.to_ascii_uppercase())
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        non_empty(series.between(start, end), start, end)
    }
}
