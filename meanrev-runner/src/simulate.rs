//! All-or-nothing, long-only account simulation.
//!
//! Fills at the signal bar's close, fractional shares, zero costs.
//! BUY while flat invests all cash; SELL while long liquidates everything;
//! HOLD and repeated signals are no-ops.

use chrono::NaiveDate;
use meanrev_core::{
    ConfigError, OpenPosition, PriceSeries, Signal, SignalSequence, TradeRecord,
};
use serde::{Deserialize, Serialize};

use crate::runner::RunError;

/// One point on an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Outcome of simulating one signal sequence over one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Account value at each bar's close.
    pub equity_curve: Vec<EquityPoint>,
    /// `initial_capital` held in the instrument from bar 0.
    pub benchmark_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    /// Still held at the last bar, marked to its close. Not counted as a trade.
    pub open_position: Option<OpenPosition>,
    pub initial_capital: f64,
    /// Fractional return of the strategy over the whole series.
    pub final_return: f64,
    /// Fractional return of buy-and-hold over the same bars.
    pub benchmark_return: f64,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.equity_curve
            .last()
            .map_or(self.initial_capital, |p| p.value)
    }

    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.value).collect()
    }

    pub fn benchmark_values(&self) -> Vec<f64> {
        self.benchmark_curve.iter().map(|p| p.value).collect()
    }
}

/// Shares held since `index`.
#[derive(Debug, Clone, Copy)]
struct Holding {
    index: usize,
    date: NaiveDate,
    price: f64,
    quantity: f64,
}

/// Replay `signals` over `series` starting from `initial_capital` in cash.
pub fn simulate(
    series: &PriceSeries,
    signals: &SignalSequence,
    initial_capital: f64,
) -> Result<BacktestResult, RunError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(ConfigError::InvalidCapital(initial_capital).into());
    }
    if signals.len() != series.len() {
        return Err(RunError::SignalLengthMismatch {
            signals: signals.len(),
            bars: series.len(),
        });
    }

    let Some(first) = series.first() else {
        return Ok(BacktestResult {
            equity_curve: Vec::new(),
            benchmark_curve: Vec::new(),
            trades: Vec::new(),
            open_position: None,
            initial_capital,
            final_return: 0.0,
            benchmark_return: 0.0,
        });
    };
    let base_close = first.close;

    let mut cash = initial_capital;
    let mut holding: Option<Holding> = None;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(series.len());
    let mut benchmark_curve = Vec::with_capacity(series.len());

    for (i, (bar, signal)) in series.bars().iter().zip(signals.iter()).enumerate() {
        match signal {
            Signal::Buy if holding.is_none() => {
                holding = Some(Holding {
                    index: i,
                    date: bar.date,
                    price: bar.close,
                    quantity: cash / bar.close,
                });
                cash = 0.0;
            }
            Signal::Sell => {
                if let Some(h) = holding.take() {
                    let proceeds = h.quantity * bar.close;
                    trades.push(TradeRecord {
                        entry_index: h.index,
                        entry_date: h.date,
                        entry_price: h.price,
                        exit_index: i,
                        exit_date: bar.date,
                        exit_price: bar.close,
                        quantity: h.quantity,
                        profit: proceeds - h.quantity * h.price,
                    });
                    cash += proceeds;
                }
            }
            _ => {}
        }

        let held = holding.map_or(0.0, |h| h.quantity * bar.close);
        equity_curve.push(EquityPoint {
            date: bar.date,
            value: cash + held,
        });
        benchmark_curve.push(EquityPoint {
            date: bar.date,
            value: initial_capital * bar.close / base_close,
        });
    }

    let last_close = series.last().map_or(base_close, |b| b.close);
    let open_position = holding.map(|h| OpenPosition {
        entry_index: h.index,
        entry_date: h.date,
        entry_price: h.price,
        quantity: h.quantity,
        mark_price: last_close,
    });

    let final_value = equity_curve.last().map_or(initial_capital, |p| p.value);

    Ok(BacktestResult {
        equity_curve,
        benchmark_curve,
        trades,
        open_position,
        initial_capital,
        final_return: final_value / initial_capital - 1.0,
        benchmark_return: last_close / base_close - 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use meanrev_core::Signal::{Buy, Hold, Sell};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_closes("SIM", start, closes).unwrap()
    }

    fn signals(s: &[Signal]) -> SignalSequence {
        SignalSequence::new(s.to_vec())
    }

    #[test]
    fn round_trip_and_benchmark() {
        // BUY at 10, SELL at 12 → 1000 shares, +2000
        let s = series(&[10.0, 11.0, 12.0, 6.0]);
        let result = simulate(&s, &signals(&[Buy, Hold, Sell, Hold]), 10_000.0).unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!((trade.entry_index, trade.exit_index), (0, 2));
        assert!((trade.quantity - 1000.0).abs() < 1e-9);
        assert!((trade.profit - 2000.0).abs() < 1e-9);

        let equity = result.equity_values();
        assert_eq!(equity, vec![10_000.0, 11_000.0, 12_000.0, 12_000.0]);
        assert!((result.final_return - 0.2).abs() < 1e-12);

        let bench = result.benchmark_values();
        assert_eq!(bench, vec![10_000.0, 11_000.0, 12_000.0, 6_000.0]);
        assert!((result.benchmark_return + 0.4).abs() < 1e-12);
        assert!(result.open_position.is_none());
    }

    #[test]
    fn duplicate_signals_are_noops() {
        let s = series(&[10.0, 20.0, 5.0, 8.0, 4.0]);
        let result =
            simulate(&s, &signals(&[Buy, Buy, Sell, Sell, Hold]), 1_000.0).unwrap();

        assert_eq!(result.trades.len(), 1);
        // Second BUY does not re-enter at 20
        assert_eq!(result.trades[0].entry_price, 10.0);
        assert_eq!(result.trades[0].exit_price, 5.0);
        assert!((result.final_value() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn sell_while_flat_does_nothing() {
        let s = series(&[10.0, 9.0, 8.0]);
        let result = simulate(&s, &signals(&[Sell, Sell, Hold]), 1_000.0).unwrap();
        assert!(result.trades.is_empty());
        assert!(result.equity_values().iter().all(|&v| v == 1_000.0));
        assert_eq!(result.final_return, 0.0);
    }

    #[test]
    fn open_position_marked_to_market() {
        let s = series(&[10.0, 12.0, 15.0]);
        let result = simulate(&s, &signals(&[Hold, Buy, Hold]), 1_200.0).unwrap();

        assert!(result.trades.is_empty());
        let open = result.open_position.as_ref().unwrap();
        assert_eq!(open.entry_index, 1);
        assert!((open.quantity - 100.0).abs() < 1e-9);
        assert_eq!(open.mark_price, 15.0);
        assert!((result.final_value() - 1_500.0).abs() < 1e-9);
        assert!((result.final_return - 0.25).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_error() {
        let s = series(&[10.0, 11.0]);
        let err = simulate(&s, &signals(&[Hold]), 1_000.0).unwrap_err();
        assert!(matches!(
            err,
            RunError::SignalLengthMismatch {
                signals: 1,
                bars: 2
            }
        ));
    }

    #[test]
    fn non_positive_capital_is_config_error() {
        let s = series(&[10.0]);
        let err = simulate(&s, &signals(&[Hold]), 0.0).unwrap_err();
        assert!(matches!(
            err,
            RunError::InvalidConfig(ConfigError::InvalidCapital(_))
        ));
    }

    #[test]
    fn empty_series_is_flat_result() {
        let s = series(&[]);
        let result = simulate(&s, &signals(&[]), 1_000.0).unwrap();
        assert!(result.equity_curve.is_empty());
        assert_eq!(result.final_value(), 1_000.0);
        assert_eq!(result.final_return, 0.0);
    }
}
