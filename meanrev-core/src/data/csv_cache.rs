//! CSV file cache for fetched series.
//!
//! Layout: `{dir}/{TICKER}_({start}-{end}).csv`, one file per request, with
//! columns `Date,Open,High,Low,Close,Volume`.
//!
//! - Writes are atomic (write to .tmp, rename into place)
//! - A file that fails to parse is an error, never a silent miss
//! - `CachedProvider` layers the cache over any other provider

use super::provider::{non_empty, DataError, DataProvider};
use crate::domain::{PriceBar, PriceSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One row of a cache file.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume")]
    volume: u64,
}

impl From<&PriceBar> for CsvRow {
    fn from(bar: &PriceBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

impl From<CsvRow> for PriceBar {
    fn from(row: CsvRow) -> Self {
        Self {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

/// Directory of cached series.
#[derive(Debug, Clone)]
pub struct CsvCache {
    dir: PathBuf,
}

impl CsvCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `symbol` over `[start, end]`.
    pub fn path_for(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_({start}-{end}).csv", file_symbol(symbol)))
    }

    /// Load a cached series. `Ok(None)` when no file exists for the request.
    pub fn load(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<PriceSeries>, DataError> {
        let path = self.path_for(symbol, start, end);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| DataError::Cache(format!("open {}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::Cache(format!("corrupt {}: {e}", path.display())))?;
            bars.push(PriceBar::from(row));
        }

        if bars.is_empty() {
            return Err(DataError::Cache(format!("empty cache file {}", path.display())));
        }

        let series = PriceSeries::new(symbol, bars)?;
        log::debug!("cache hit: {} ({} bars)", path.display(), series.len());
        Ok(Some(series))
    }

    /// Write a series for `[start, end]`, replacing any previous file.
    pub fn store(
        &self,
        series: &PriceSeries,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PathBuf, DataError> {
        if series.is_empty() {
            return Err(DataError::Cache("no bars to cache".into()));
        }

        fs::create_dir_all(&self.dir)
            .map_err(|e| DataError::Cache(format!("failed to create dir: {e}")))?;

        let path = self.path_for(series.ticker(), start, end);
        let tmp_path = path.with_extension("csv.tmp");

        write_rows(&tmp_path, series.bars())?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::Cache(format!("atomic rename failed: {e}"))
        })?;

        log::debug!("cached {} bars at {}", series.len(), path.display());
        Ok(path)
    }
}

fn write_rows(path: &Path, bars: &[PriceBar]) -> Result<(), DataError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| DataError::Cache(format!("create {}: {e}", path.display())))?;
    for bar in bars {
        writer
            .serialize(CsvRow::from(bar))
            .map_err(|e| DataError::Cache(format!("write {}: {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| DataError::Cache(format!("flush {}: {e}", path.display())))
}

/// Upper-cased, with `.` replaced so class shares (`BRK.B`) keep one extension.
fn file_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase().replace('.', "-")
}

/// Serves requests from a `CsvCache`, falling back to `inner` on a miss.
///
/// A miss is written back so the next identical request stays offline.
pub struct CachedProvider<P> {
    inner: P,
    cache: CsvCache,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: CsvCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &CsvCache {
        &self.cache
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        "csv_cache"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        if let Some(series) = self.cache.load(symbol, start, end)? {
            return non_empty(series.between(start, end), start, end);
        }

        log::info!("cache miss for {symbol}, fetching from {}", self.inner.name());
        let series = self.inner.fetch(symbol, start, end)?;
        self.cache.store(&series, start, end)?;
        Ok(series)
    }
}
