//! Ordered daily bars for one ticker over a requested range.
//!
//! Invariant: dates are strictly increasing and every close is finite and
//! positive. Construction enforces it (sort, drop duplicate dates, reject bad
//! closes), so every consumer downstream can index by position without
//! re-checking.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

use super::bar::PriceBar;

/// Why a set of bars could not become a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("{ticker}: invalid close {close} on {date}")]
    InvalidClose {
        ticker: String,
        date: NaiveDate,
        close: f64,
    },
}

/// Ordered daily bars for a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars in any order.
    ///
    /// Bars are sorted by date; for duplicate dates the first occurrence in
    /// the input wins. A bar with a non-finite or non-positive close is an
    /// error rather than a silent drop.
    pub fn new(ticker: impl Into<String>, mut bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        let ticker = ticker.into();

        if let Some(bad) = bars.iter().find(|b| !b.has_valid_close()) {
            return Err(SeriesError::InvalidClose {
                ticker,
                date: bad.date,
                close: bad.close,
            });
        }

        // Stable sort keeps input order among equal dates, so dedup keeps the first.
        bars.sort_by_key(|b| b.date);
        bars.dedup_by_key(|b| b.date);

        Ok(Self { ticker, bars })
    }

    /// Build a series from close prices alone, one bar per weekday from `start`.
    ///
    /// Open is the previous close, high/low bracket open and close. Handy for
    /// synthetic inputs where only closes matter.
    pub fn from_closes(
        ticker: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, SeriesError> {
        let mut date = next_weekday(start);
        let mut bars = Vec::with_capacity(closes.len());
        for (i, &close) in closes.iter().enumerate() {
            let open = if i == 0 { close } else { closes[i - 1] };
            bars.push(PriceBar {
                date,
                open,
                high: open.max(close),
                low: open.min(close),
                close,
                volume: 1_000,
            });
            date = next_weekday(date + Duration::days(1));
        }
        Self::new(ticker, bars)
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Close prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bar dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// A sub-series over a positional range. Ordering is inherited.
    pub fn slice(&self, range: Range<usize>) -> PriceSeries {
        Self {
            ticker: self.ticker.clone(),
            bars: self.bars[range].to_vec(),
        }
    }

    /// Bars falling inside `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        Self {
            ticker: self.ticker.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Whether bar `index` is the last bar of its calendar month in this series.
    ///
    /// The final bar is never treated as a month end: the series may have been
    /// cut mid-month and there is no following bar to prove otherwise.
    pub fn is_month_end(&self, index: usize) -> bool {
        match (self.bars.get(index), self.bars.get(index + 1)) {
            (Some(cur), Some(next)) => {
                cur.date.month() != next.date.month() || cur.date.year() != next.date.year()
            }
            _ => false,
        }
    }
}

fn next_weekday(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
        }
    }

    #[test]
    fn new_sorts_and_dedups() {
        let series = PriceSeries::new(
            "SPY",
            vec![
                bar(d(2024, 1, 4), 3.0),
                bar(d(2024, 1, 2), 1.0),
                bar(d(2024, 1, 3), 2.0),
                bar(d(2024, 1, 2), 99.0),
            ],
        )
        .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        for w in series.bars().windows(2) {
            assert!(w[0].date < w[1].date);
        }
    }

    #[test]
    fn new_rejects_bad_close() {
        let err = PriceSeries::new("SPY", vec![bar(d(2024, 1, 2), f64::NAN)]).unwrap_err();
        assert!(matches!(err, SeriesError::InvalidClose { .. }));

        let err = PriceSeries::new("SPY", vec![bar(d(2024, 1, 2), -1.0)]).unwrap_err();
        assert!(err.to_string().contains("SPY"));
    }

    #[test]
    fn from_closes_skips_weekends() {
        // 2024-01-05 is a Friday
        let series = PriceSeries::from_closes("T", d(2024, 1, 5), &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(series.dates(), vec![d(2024, 1, 5), d(2024, 1, 8), d(2024, 1, 9)]);
    }

    #[test]
    fn from_closes_starting_on_weekend_moves_to_monday() {
        let series = PriceSeries::from_closes("T", d(2024, 1, 6), &[1.0]).unwrap();
        assert_eq!(series.first().unwrap().date, d(2024, 1, 8));
    }

    #[test]
    fn between_filters_inclusive() {
        let series = PriceSeries::from_closes("T", d(2024, 1, 1), &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let sub = series.between(d(2024, 1, 2), d(2024, 1, 3));
        assert_eq!(sub.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn month_end_detection() {
        let series = PriceSeries::new(
            "T",
            vec![
                bar(d(2024, 1, 30), 1.0),
                bar(d(2024, 1, 31), 1.0),
                bar(d(2024, 2, 1), 1.0),
                bar(d(2024, 2, 2), 1.0),
            ],
        )
        .unwrap();
        assert!(!series.is_month_end(0));
        assert!(series.is_month_end(1));
        assert!(!series.is_month_end(2));
        // last bar is never a month end
        assert!(!series.is_month_end(3));
    }

    #[test]
    fn empty_series_is_allowed() {
        let series = PriceSeries::new("T", Vec::new()).unwrap();
        assert!(series.is_empty());
        assert!(series.first().is_none());
    }
}
