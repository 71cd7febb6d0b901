//! Strategy evaluation — turns a price series into one signal per bar.
//!
//! Each variant of `StrategyConfig` maps to a `SignalGenerator`. Generators
//! are portfolio-agnostic: they see closes and dates, never the account.
//! The signal at bar `i` may only depend on bars `0..=i`.

pub mod bollinger;
pub mod buy_and_hold;
pub mod config;
pub mod double_seven;
pub mod moving_average;
pub mod rsi2;
pub mod vix_ma;

pub use bollinger::BollingerReversion;
pub use buy_and_hold::BuyAndHold;
pub use config::{ConfigError, MaSchedule, StrategyConfig, StrategyDefaults};
pub use double_seven::DoubleSeven;
pub use moving_average::MovingAverageThreshold;
pub use rsi2::Rsi2;
pub use vix_ma::VixSpike;

use crate::domain::{PriceSeries, Signal, SignalSequence};

/// A rule that emits BUY/SELL/HOLD for every bar of a series.
pub trait SignalGenerator: Send + Sync {
    /// Machine name (e.g., "double_seven").
    fn name(&self) -> &str;

    /// Number of bars needed before this generator can emit anything but HOLD.
    fn warmup_bars(&self) -> usize;

    /// Signals for the whole series, same length as `series`.
    fn generate(&self, series: &PriceSeries) -> Vec<Signal>;

    /// Signals given a second series (a volatility index). Single-series
    /// generators ignore it.
    fn generate_with(&self, series: &PriceSeries, _aux: Option<&PriceSeries>) -> Vec<Signal> {
        self.generate(series)
    }
}

/// Build the generator for a validated config.
///
/// Constructors assert their window sizes, so callers validate first.
pub fn create_generator(config: &StrategyConfig) -> Box<dyn SignalGenerator> {
    match config {
        StrategyConfig::BuyAndHold => Box::new(BuyAndHold),
        StrategyConfig::MovingAverage { period, schedule } => {
            Box::new(MovingAverageThreshold::new(*period, *schedule))
        }
        StrategyConfig::Bollinger { window, k } => Box::new(BollingerReversion::new(*window, *k)),
        StrategyConfig::DoubleSeven {
            lookback,
            trend_period,
        } => Box::new(DoubleSeven::new(*lookback, *trend_period)),
        StrategyConfig::Rsi2 {
            rsi_period,
            entry_ma,
            exit_ma,
            oversold,
        } => Box::new(Rsi2::new(*rsi_period, *entry_ma, *exit_ma, *oversold)),
        StrategyConfig::VixMa {
            vix_period,
            spike,
            trend_period,
            ..
        } => Box::new(VixSpike::new(*trend_period, *vix_period, *spike)),
    }
}

/// Evaluate a strategy over a series.
///
/// Never fails. Bars before the longest window fills are HOLD, a series
/// shorter than the window is all-HOLD, and an invalid config (which the
/// runner rejects before fetching) also yields all-HOLD.
pub fn evaluate(series: &PriceSeries, config: &StrategyConfig) -> SignalSequence {
    evaluate_with(series, None, config)
}

/// Evaluate a strategy that may read a second series.
///
/// `aux` must hold closes for `config.auxiliary_symbol()`. When the config
/// names one and `aux` is `None` the result is all-HOLD.
pub fn evaluate_with(
    series: &PriceSeries,
    aux: Option<&PriceSeries>,
    config: &StrategyConfig,
) -> SignalSequence {
    if let Err(e) = config.validate() {
        log::warn!("{}: not evaluating, {e}", series.ticker());
        return SignalSequence::hold(series.len());
    }
    if let (Some(symbol), None) = (config.auxiliary_symbol(), aux) {
        log::warn!(
            "{}: {} needs {symbol} closes, none given; every signal is HOLD",
            series.ticker(),
            config.name()
        );
        return SignalSequence::hold(series.len());
    }

    let generator = create_generator(config);
    let mut signals = generator.generate_with(series, aux);
    // Generators are written to this contract; pad or cut rather than panic downstream.
    signals.resize(series.len(), Signal::Hold);

    let sequence = SignalSequence::new(signals);
    log::debug!(
        "{} on {}: {} bars, {} buys, {} sells",
        generator.name(),
        series.ticker(),
        sequence.len(),
        sequence.buy_count(),
        sequence.sell_count()
    );
    sequence
}


#[cfg(test)]
mod tests {
    use super::test_support::series;
    use super::*;

    #[test]
    fn output_length_matches_input_for_every_strategy() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let s = series(&closes);
        for name in StrategyConfig::NAMES {
            let config: StrategyConfig = name.parse().unwrap();
            assert_eq!(evaluate(&s, &config).len(), s.len(), "{name}");
        }
    }

    #[test]
    fn invalid_config_yields_all_hold() {
        let s = series(&[1.0, 2.0, 3.0]);
        let config = StrategyConfig::Bollinger { window: 0, k: 2.0 };
        assert_eq!(evaluate(&s, &config), SignalSequence::hold(3));
    }

    #[test]
    fn empty_series_yields_empty_sequence() {
        let s = series(&[]);
        for name in StrategyConfig::NAMES {
            let config: StrategyConfig = name.parse().unwrap();
            assert!(evaluate(&s, &config).is_empty());
        }
    }

    #[test]
    fn volatility_strategy_without_series_is_all_hold() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + i as f64).collect();
        let s = series(&closes);
        let config: StrategyConfig = "vix_ma".parse().unwrap();
        assert_eq!(evaluate(&s, &config), SignalSequence::hold(s.len()));
    }

    #[test]
    fn generator_names_match_config_names() {
        for name in StrategyConfig::NAMES {
            let config: StrategyConfig = name.parse().unwrap();
            let generator = create_generator(&config);
            assert_eq!(generator.name(), config.name());
            assert_eq!(generator.warmup_bars(), config.warmup_bars());
        }
    }
}
