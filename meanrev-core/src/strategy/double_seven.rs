//! Double Seven — buy a fresh N-bar closing low, sell a fresh N-bar closing high.
//!
//! The trailing window holds `lookback` closes including today. Today's
//! close must be strictly below (BUY) or strictly above (SELL) every other
//! close in it; a tie with an earlier close is HOLD. The comparison channel
//! covers the previous `lookback - 1` closes, so today never compares
//! against itself.
//!
//! With `trend_period` set, signals only fire while close is above that
//! SMA.

use crate::domain::{PriceSeries, Signal};
use crate::indicators::{Donchian, Indicator, Sma};

use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct DoubleSeven {
    lookback: usize,
    upper: Donchian,
    lower: Donchian,
    trend: Option<Sma>,
}

impl DoubleSeven {
    pub fn new(lookback: usize, trend_period: Option<usize>) -> Self {
        assert!(lookback >= 2, "Double Seven lookback must be >= 2");
        Self {
            lookback,
            upper: Donchian::upper(lookback - 1),
            lower: Donchian::lower(lookback - 1),
            trend: trend_period.map(Sma::new),
        }
    }
}

impl SignalGenerator for DoubleSeven {
    fn name(&self) -> &str {
        "double_seven"
    }

    fn warmup_bars(&self) -> usize {
        let trend = self.trend.as_ref().map_or(0, Sma::period);
        self.lookback.max(trend)
    }

    fn generate(&self, series: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let n = closes.len();
        let mut signals = vec![Signal::Hold; n];

        let highest = self.upper.compute(&closes);
        let lowest = self.lower.compute(&closes);
        let trend = self.trend.as_ref().map(|sma| sma.compute(&closes));

        for i in 1..n {
            let (prior_high, prior_low) = (highest[i - 1], lowest[i - 1]);
            if prior_high.is_nan() || prior_low.is_nan() {
                continue;
            }

            if let Some(trend) = &trend {
                if trend[i].is_nan() || closes[i] <= trend[i] {
                    continue;
                }
            }

            if closes[i] < prior_low {
                signals[i] = Signal::Buy;
            } else if closes[i] > prior_high {
                signals[i] = Signal::Sell;
            }
        }

        signals
    }
}
