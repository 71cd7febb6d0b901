//! Data providers: Yahoo Finance, the CSV cache layer, and offline sources.

pub mod csv_cache;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_cache::{CachedProvider, CsvCache};
pub use provider::{DataError, DataProvider};
pub use synthetic::{StaticProvider, SyntheticProvider};
pub use yahoo::YahooProvider;
