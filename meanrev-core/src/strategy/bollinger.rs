//! Bollinger band reversion.
//!
//! BUY when close drops strictly below the lower band (mean - k·σ), SELL
//! once close is back at or above the mean. Population σ over `window`
//! closes.

use crate::domain::{PriceSeries, Signal};
use crate::indicators::{Bollinger, Indicator};

use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct BollingerReversion {
    window: usize,
    middle: Bollinger,
    lower: Bollinger,
}

impl BollingerReversion {
    pub fn new(window: usize, k: f64) -> Self {
        Self {
            window,
            middle: Bollinger::middle(window, k),
            lower: Bollinger::lower(window, k),
        }
    }
}

impl SignalGenerator for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger"
    }

    fn warmup_bars(&self) -> usize {
        self.window
    }

    fn generate(&self, series: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let mean = self.middle.compute(&closes);
        let lower = self.lower.compute(&closes);

        closes
            .iter()
            .zip(mean.iter().zip(lower.iter()))
            .map(|(&close, (&mean, &lower))| {
                if mean.is_nan() || lower.is_nan() {
                    Signal::Hold
                } else if close < lower {
                    Signal::Buy
                } else if close >= mean {
                    Signal::Sell
                } else {
                    Signal::Hold
                }
            })
            .collect()
    }
}
