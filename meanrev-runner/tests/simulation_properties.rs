//! Property tests for the account simulation.
//!
//! Uses proptest to verify:
//! 1. Curves have one point per bar and share its dates
//! 2. Benchmark curve is capital scaled by close / first close
//! 3. Final value = capital + realized profit + unrealized profit
//! 4. Trades are sequential and never overlap
//! 5. All-HOLD keeps equity flat at the initial capital
//! 6. Buy & hold from 10 000 on a series that doubles returns exactly 100%

use chrono::NaiveDate;
use proptest::prelude::*;

use meanrev_core::{evaluate, PriceSeries, Signal, SignalSequence, StrategyConfig};
use meanrev_runner::metrics::{longest_drawdown_duration, max_drawdown};
use meanrev_runner::simulate;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![
        3 => Just(Signal::Hold),
        1 => Just(Signal::Buy),
        1 => Just(Signal::Sell),
    ]
}

/// Closes and an aligned signal per bar.
fn arb_run(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<Signal>)> {
    (1..max_len).prop_flat_map(|n| {
        (
            prop::collection::vec(1.0..500.0_f64, n),
            prop::collection::vec(arb_signal(), n),
        )
    })
}

fn series(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    PriceSeries::from_closes("PROP", start, closes).unwrap()
}

// ── 1–4. Accounting ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn accounting_invariants(
        (closes, signals) in arb_run(150),
        capital in 100.0..1_000_000.0_f64,
    ) {
        let s = series(&closes);
        let result = simulate(&s, &SignalSequence::new(signals), capital).unwrap();

        prop_assert_eq!(result.equity_curve.len(), s.len());
        prop_assert_eq!(result.benchmark_curve.len(), s.len());

        for (i, bar) in s.bars().iter().enumerate() {
            prop_assert_eq!(result.equity_curve[i].date, bar.date);
            let expected = capital * bar.close / closes[0];
            prop_assert!((result.benchmark_curve[i].value - expected).abs() <= 1e-9 * expected);
            prop_assert!(result.equity_curve[i].value > 0.0);
        }

        let realized: f64 = result.trades.iter().map(|t| t.profit).sum();
        let unrealized = result.open_position.as_ref().map_or(0.0, |p| p.unrealized_profit());
        let expected = capital + realized + unrealized;
        prop_assert!((result.final_value() - expected).abs() <= 1e-6 * expected.max(1.0));

        for w in result.trades.windows(2) {
            prop_assert!(w[0].exit_index <= w[1].entry_index);
        }
        if let (Some(last), Some(open)) = (result.trades.last(), &result.open_position) {
            prop_assert!(last.exit_index <= open.entry_index);
        }
    }
}

// ── 5. All-HOLD ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn all_hold_is_flat(closes in prop::collection::vec(1.0..500.0_f64, 1..100)) {
        let s = series(&closes);
        let result = simulate(&s, &SignalSequence::hold(s.len()), 10_000.0).unwrap();

        prop_assert!(result.trades.is_empty());
        prop_assert!(result.open_position.is_none());
        prop_assert!(result.equity_curve.iter().all(|p| p.value == 10_000.0));
        prop_assert_eq!(max_drawdown(&result.equity_values()), 0.0);
        prop_assert_eq!(longest_drawdown_duration(&result.equity_values()), 0);
    }
}

// ── 6. Buy & hold doubling ───────────────────────────────────────────

fn assert_doubles(closes: &[f64]) -> Result<(), TestCaseError> {
    let s = series(closes);
    let signals = evaluate(&s, &StrategyConfig::BuyAndHold);
    let result = simulate(&s, &signals, 10_000.0).unwrap();

    prop_assert!((result.final_return - 1.0).abs() < 1e-9, "return {}", result.final_return);
    prop_assert!((result.final_value() - 20_000.0).abs() < 1e-6);
    prop_assert!((result.benchmark_return - 1.0).abs() < 1e-9);
    prop_assert!(result.trades.is_empty());
    prop_assert!(result.open_position.is_some());
    Ok(())
}

#[test]
fn buy_and_hold_doubling_is_100_percent() {
    assert_doubles(&[50.0, 55.0, 48.0, 70.0, 100.0]).unwrap();
}

proptest! {
    #[test]
    fn buy_and_hold_doubling_any_path(
        first in 1.0..500.0_f64,
        middle in prop::collection::vec(1.0..1_000.0_f64, 0..100),
    ) {
        let mut closes = Vec::with_capacity(middle.len() + 2);
        closes.push(first);
        closes.extend(middle);
        closes.push(first * 2.0);
        assert_doubles(&closes)?;
    }
}
