//! Moving-average threshold — long above the N-day SMA, flat below it.
//!
//! Daily schedule: BUY on the bar where close moves above the SMA, SELL on
//! the bar where it moves below. The first bar with a defined SMA counts as
//! "previously not above", so a series that opens above its average buys
//! immediately; a SELL needs a defined previous bar. Close == SMA is neither
//! above nor below and is HOLD.
//!
//! Month-end schedule: only the last bar of each calendar month acts, by
//! level: BUY if close > SMA, SELL if close < SMA.

use crate::domain::{PriceSeries, Signal};
use crate::indicators::{Indicator, Sma};

use super::{MaSchedule, SignalGenerator};

#[derive(Debug, Clone)]
pub struct MovingAverageThreshold {
    sma: Sma,
    schedule: MaSchedule,
}

impl MovingAverageThreshold {
    pub fn new(period: usize, schedule: MaSchedule) -> Self {
        Self {
            sma: Sma::new(period),
            schedule,
        }
    }

    fn daily(&self, closes: &[f64], sma: &[f64]) -> Vec<Signal> {
        let mut signals = vec![Signal::Hold; closes.len()];

        for i in 0..closes.len() {
            let (close, avg) = (closes[i], sma[i]);
            if avg.is_nan() {
                continue;
            }

            let prev = i.checked_sub(1).map(|p| (closes[p], sma[p]));
            let prev_above = matches!(prev, Some((c, a)) if !a.is_nan() && c > a);
            let prev_below_or_missing = match prev {
                Some((c, a)) => a.is_nan() || c < a,
                None => true,
            };

            if close > avg && !prev_above {
                signals[i] = Signal::Buy;
            } else if close < avg && !prev_below_or_missing {
                signals[i] = Signal::Sell;
            }
        }

        signals
    }

    fn month_end(&self, series: &PriceSeries, closes: &[f64], sma: &[f64]) -> Vec<Signal> {
        let mut signals = vec![Signal::Hold; closes.len()];

        for i in 0..closes.len() {
            if sma[i].is_nan() || !series.is_month_end(i) {
                continue;
            }
            if closes[i] > sma[i] {
                signals[i] = Signal::Buy;
            } else if closes[i] < sma[i] {
                signals[i] = Signal::Sell;
            }
        }

        signals
    }
}

impl SignalGenerator for MovingAverageThreshold {
    fn name(&self) -> &str {
        "moving_average"
    }

    fn warmup_bars(&self) -> usize {
        self.sma.period()
    }

    fn generate(&self, series: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let sma = self.sma.compute(&closes);

        match self.schedule {
            MaSchedule::Daily => self.daily(&closes, &sma),
            MaSchedule::MonthEnd => self.month_end(series, &closes, &sma),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use crate::strategy::test_support::series;
    use chrono::NaiveDate;
    use Signal::{Buy, Hold, Sell};

    #[test]
    fn first_n_minus_one_bars_hold() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let signals = MovingAverageThreshold::new(10, MaSchedule::Daily).generate(&series(&closes));
        assert!(signals[..9].iter().all(|s| *s == Hold));
    }

    #[test]
    fn crossing_above_and_below() {
        // SMA(3) from index 2: [2, 2, 2, 7/3, 8/3 ...]
        let closes = [2.0, 2.0, 2.0, 3.0, 3.0, 1.0, 1.0];
        let signals = MovingAverageThreshold::new(3, MaSchedule::Daily).generate(&series(&closes));
        // idx2: close == sma → HOLD
        // idx3: close 3 > sma 7/3, prev not above → BUY
        // idx4: close 3 > sma 8/3, prev above → HOLD
        // idx5: close 1 < sma 7/3, prev above → SELL
        // idx6: close 1 < sma 5/3, prev below → HOLD
        assert_eq!(signals, vec![Hold, Hold, Hold, Buy, Hold, Sell, Hold]);
    }

    #[test]
    fn opening_above_average_buys_on_first_evaluable_bar() {
        let closes = [1.0, 2.0, 3.0, 4.0];
        let signals = MovingAverageThreshold::new(3, MaSchedule::Daily).generate(&series(&closes));
        assert_eq!(signals, vec![Hold, Hold, Buy, Hold]);
    }

    #[test]
    fn opening_below_average_does_not_sell() {
        let closes = [4.0, 3.0, 2.0, 1.0];
        let signals = MovingAverageThreshold::new(3, MaSchedule::Daily).generate(&series(&closes));
        assert_eq!(signals, vec![Hold, Hold, Hold, Hold]);
    }

    #[test]
    fn short_series_is_all_hold() {
        let signals =
            MovingAverageThreshold::new(200, MaSchedule::Daily).generate(&series(&[1.0, 2.0, 3.0]));
        assert_eq!(signals, vec![Hold; 3]);
    }

    #[test]
    fn month_end_acts_only_on_last_bar_of_month() {
        let d = |m: u32, day: u32| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let bar = |date: NaiveDate, close: f64| PriceBar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        };
        let s = PriceSeries::new(
            "T",
            vec![
                bar(d(1, 29), 10.0),
                bar(d(1, 30), 11.0),
                bar(d(1, 31), 12.0), // month end, above SMA(2)=11.5 → BUY
                bar(d(2, 1), 5.0),
                bar(d(2, 28), 6.0),
                bar(d(2, 29), 4.0), // month end, below SMA(2)=5 → SELL
                bar(d(3, 1), 9.0),  // last bar: never a month end
            ],
        )
        .unwrap();

        let signals = MovingAverageThreshold::new(2, MaSchedule::MonthEnd).generate(&s);
        assert_eq!(signals, vec![Hold, Hold, Buy, Hold, Hold, Sell, Hold]);
    }
}
