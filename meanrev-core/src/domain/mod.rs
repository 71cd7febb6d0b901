//! Domain types: bars, series, signals, trades.

pub mod bar;
pub mod series;
pub mod signal;
pub mod trade;

pub use bar::PriceBar;
pub use series::{PriceSeries, SeriesError};
pub use signal::{Signal, SignalSequence};
pub use trade::{OpenPosition, TradeRecord};
