//! Two-period RSI pullback.
//!
//! BUY when close is above the long entry SMA and RSI is at or below the
//! oversold threshold. SELL when close crosses above the short exit SMA
//! (previous close at or below its SMA, current close above).

use crate::domain::{PriceSeries, Signal};
use crate::indicators::{Indicator, Rsi, Sma};

use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct Rsi2 {
    rsi_period: usize,
    rsi: Rsi,
    entry_ma: Sma,
    exit_ma: Sma,
    oversold: f64,
}

impl Rsi2 {
    pub fn new(rsi_period: usize, entry_ma: usize, exit_ma: usize, oversold: f64) -> Self {
        Self {
            rsi_period,
            rsi: Rsi::new(rsi_period),
            entry_ma: Sma::new(entry_ma),
            exit_ma: Sma::new(exit_ma),
            oversold,
        }
    }
}

impl SignalGenerator for Rsi2 {
    fn name(&self) -> &str {
        "rsi2"
    }

    fn warmup_bars(&self) -> usize {
        self.entry_ma
            .period()
            .max(self.rsi_period + 1)
            .max(self.exit_ma.period() + 1)
    }

    fn generate(&self, series: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let rsi = self.rsi.compute(&closes);
        let entry = self.entry_ma.compute(&closes);
        let exit = self.exit_ma.compute(&closes);

        let mut signals = vec![Signal::Hold; closes.len()];
        for i in 1..closes.len() {
            // Both legs share one warmup
            if [rsi[i], entry[i], exit[i], exit[i - 1]]
                .iter()
                .any(|v| v.is_nan())
            {
                continue;
            }

            if closes[i] > entry[i] && rsi[i] <= self.oversold {
                signals[i] = Signal::Buy;
            } else if closes[i - 1] <= exit[i - 1] && closes[i] > exit[i] {
                signals[i] = Signal::Sell;
            }
        }

        signals
    }
}
