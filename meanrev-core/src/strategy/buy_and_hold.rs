//! Buy and hold, the benchmark every other strategy is compared against.

use crate::domain::{PriceSeries, Signal};

use super::SignalGenerator;

/// BUY on the first bar, HOLD on every bar after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalGenerator for BuyAndHold {
    fn name(&self) -> &str {
        "buy_and_hold"
    }

    fn warmup_bars(&self) -> usize {
        1
    }

    fn generate(&self, series: &PriceSeries) -> Vec<Signal> {
        let mut signals = vec![Signal::Hold; series.len()];
        if let Some(first) = signals.first_mut() {
            *first = Signal::Buy;
        }
        signals
    }
}
