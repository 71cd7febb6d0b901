//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over where bars come from (Yahoo Finance,
//! the CSV cache, synthetic series) so the runner never knows and tests never
//! touch the network.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Why a fetch produced no usable series.
///
/// Every variant is a "data unavailable" condition: the run that asked for
/// the data aborts, a batch moves on to its next entry.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} fetching {symbol}")]
    Http { status: u16, symbol: String },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("provider refused the request: {0}")]
    Blocked(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Invalid(#[from] SeriesError),
}

/// A source of daily bars.
///
/// Implementations return a validated `PriceSeries` restricted to
/// `[start, end]`. A range with no bars is `DataError::NoData`, never an
/// empty series. Providers do not retry.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `[start, end]`.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError>;
}

impl<P: DataProvider + ?Sized> DataProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        (**self).fetch(symbol, start, end)
    }
}

/// Turn a possibly-empty series into the provider contract's result.
pub(crate) fn non_empty(
    series: PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PriceSeries, DataError> {
    if series.is_empty() {
        return Err(DataError::NoData {
            symbol: series.ticker().to_string(),
            start,
            end,
        });
    }
    Ok(series)
}
