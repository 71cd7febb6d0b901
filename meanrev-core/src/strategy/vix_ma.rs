//! Volatility-spike entry on month ends.
//!
//! Needs a second series: a volatility index such as `^VIX`. On the last bar
//! of each month, with `level = vix_sma * (1 + spike)`:
//! - VIX above `level` and close above the long trend SMA: BUY
//! - VIX below `level`: SELL, whatever the trend
//! - otherwise HOLD
//!
//! VIX values are matched to instrument bars by date, carrying the last
//! known VIX close forward over gaps. A VIX bar dated after an instrument bar
//! is never used for it.

use crate::domain::{PriceSeries, Signal};
use crate::indicators::{Indicator, Sma};

use super::SignalGenerator;

#[derive(Debug, Clone)]
pub struct VixSpike {
    trend: Sma,
    vix_ma: Sma,
    spike: f64,
}

impl VixSpike {
    pub fn new(trend_period: usize, vix_period: usize, spike: f64) -> Self {
        Self {
            trend: Sma::new(trend_period),
            vix_ma: Sma::new(vix_period),
            spike,
        }
    }

    fn signals(&self, series: &PriceSeries, vix: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let trend = self.trend.compute(&closes);

        let vix_closes = vix.closes();
        let vix_avg = self.vix_ma.compute(&vix_closes);
        let vix_now = align_to(series, vix, &vix_closes);
        let vix_avg = align_to(series, vix, &vix_avg);

        let mut signals = vec![Signal::Hold; closes.len()];
        for i in 0..closes.len() {
            if !series.is_month_end(i) {
                continue;
            }
            if [trend[i], vix_now[i], vix_avg[i]].iter().any(|v| v.is_nan()) {
                continue;
            }

            let level = vix_avg[i] * (1.0 + self.spike);
            if vix_now[i] > level {
                if closes[i] > trend[i] {
                    signals[i] = Signal::Buy;
                }
            } else if vix_now[i] < level {
                signals[i] = Signal::Sell;
            }
        }

        signals
    }
}

/// Value of `source` in effect at each bar of `target`.
///
/// NaN before the first `source` bar.
fn align_to(target: &PriceSeries, source: &PriceSeries, values: &[f64]) -> Vec<f64> {
    let source_bars = source.bars();
    let mut aligned = Vec::with_capacity(target.len());
    let mut j = 0;
    let mut current = f64::NAN;

    for bar in target.bars() {
        while j < source_bars.len() && source_bars[j].date <= bar.date {
            current = values[j];
            j += 1;
        }
        aligned.push(current);
    }

    aligned
}

impl SignalGenerator for VixSpike {
    fn name(&self) -> &str {
        "vix_ma"
    }

    fn warmup_bars(&self) -> usize {
        self.trend.period().max(self.vix_ma.period())
    }

    /// Without a volatility series there is nothing to gate on.
    fn generate(&self, series: &PriceSeries) -> Vec<Signal> {
        vec![Signal::Hold; series.len()]
    }

    fn generate_with(&self, series: &PriceSeries, aux: Option<&PriceSeries>) -> Vec<Signal> {
        match aux {
            Some(vix) => self.signals(series, vix),
            None => self.generate(series),
        }
    }
}
