//! Discrete trading signals aligned one-to-one with a `PriceSeries`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::series::PriceSeries;

/// Action a strategy asks for on a given bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// One signal per bar, index `i` belongs to bar `i` of the evaluated series.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalSequence {
    signals: Vec<Signal>,
}

impl SignalSequence {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self { signals }
    }

    /// All-HOLD sequence of the given length.
    pub fn hold(len: usize) -> Self {
        Self {
            signals: vec![Signal::Hold; len],
        }
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Signal> {
        self.signals.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Signal] {
        &self.signals
    }

    pub fn iter(&self) -> impl Iterator<Item = Signal> + '_ {
        self.signals.iter().copied()
    }

    pub fn buy_count(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Buy).count()
    }

    pub fn sell_count(&self) -> usize {
        self.signals.iter().filter(|s| **s == Signal::Sell).count()
    }

    /// Pair every non-HOLD signal with the date of its bar.
    pub fn dated(&self, series: &PriceSeries) -> Vec<(NaiveDate, Signal)> {
        series
            .bars()
            .iter()
            .zip(self.signals.iter())
            .filter(|(_, s)| **s != Signal::Hold)
            .map(|(b, s)| (b.date, *s))
            .collect()
    }
}

impl From<Vec<Signal>> for SignalSequence {
    fn from(signals: Vec<Signal>) -> Self {
        Self::new(signals)
    }
}
