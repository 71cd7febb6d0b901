//! MeanRev Core — domain types, indicators, strategy evaluation and data access.
//!
//! - Domain types (bars, series, signals, trades)
//! - Rolling indicators over closes (SMA, Bollinger, Donchian, RSI)
//! - Strategy evaluator: config enum → one signal per bar
//! - Data providers (Yahoo Finance, CSV cache, synthetic)

pub mod data;
pub mod domain;
pub mod indicators;
pub mod strategy;

pub use data::{DataError, DataProvider};
pub use domain::{OpenPosition, PriceBar, PriceSeries, SeriesError, Signal, SignalSequence, TradeRecord};
pub use strategy::{evaluate, evaluate_with, ConfigError, MaSchedule, StrategyConfig, StrategyDefaults};
