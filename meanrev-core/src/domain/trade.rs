//! A completed long round trip from entry to exit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A closed all-in position. Open positions are not trades until they exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    // ── Size ──
    pub quantity: f64,

    // ── PnL ──
    pub profit: f64,
}

impl TradeRecord {
    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.quantity == 0.0 {
            return 0.0;
        }
        self.profit / (self.entry_price * self.quantity)
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index.saturating_sub(self.entry_index)
    }

    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}

/// A position still held at the last bar, marked to that bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub quantity: f64,
    pub mark_price: f64,
}

impl OpenPosition {
    pub fn market_value(&self) -> f64 {
        self.quantity * self.mark_price
    }

    pub fn unrealized_profit(&self) -> f64 {
        self.quantity * (self.mark_price - self.entry_price)
    }
}
