//! Strategy selection — a closed set of variants with their parameters.
//!
//! `StrategyConfig` is what every caller passes around: the CLI builds one
//! from flags, batch files deserialize one from TOML (`type = "bollinger"`),
//! and the runner validates it before touching the network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─── Error type ──────────────────────────────────────────────────────

/// Configuration rejected before any data is fetched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown strategy '{0}' (expected one of: {names})", names = StrategyConfig::NAMES.join(", "))]
    UnknownStrategy(String),

    #[error("invalid {strategy} config: {reason}")]
    InvalidStrategyConfig {
        strategy: &'static str,
        reason: String,
    },

    #[error("initial capital must be finite and positive, got {0}")]
    InvalidCapital(f64),

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("failed to parse config: {0}")]
    Parse(String),
}

// ─── Defaults ────────────────────────────────────────────────────────

/// Default parameter values used when a strategy is selected by name.
///
/// Passed explicitly to `StrategyConfig::from_name`; serde fills missing
/// fields from `StrategyDefaults::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyDefaults {
    pub ma_period: usize,
    pub ma_schedule: MaSchedule,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
    pub double_seven_lookback: usize,
    pub double_seven_trend_period: Option<usize>,
    pub rsi_period: usize,
    pub rsi_entry_ma: usize,
    pub rsi_exit_ma: usize,
    pub rsi_oversold: f64,
    pub vix_symbol: String,
    pub vix_period: usize,
    pub vix_spike: f64,
    pub vix_trend_period: usize,
}

impl Default for StrategyDefaults {
    fn default() -> Self {
        Self {
            ma_period: 200,
            ma_schedule: MaSchedule::Daily,
            bollinger_window: 40,
            bollinger_k: 2.0,
            double_seven_lookback: 7,
            double_seven_trend_period: None,
            rsi_period: 2,
            rsi_entry_ma: 200,
            rsi_exit_ma: 5,
            rsi_oversold: 10.0,
            vix_symbol: "^VIX".to_string(),
            vix_period: 10,
            vix_spike: 0.05,
            vix_trend_period: 200,
        }
    }
}

fn default_ma_period() -> usize {
    StrategyDefaults::default().ma_period
}

fn default_bollinger_window() -> usize {
    StrategyDefaults::default().bollinger_window
}

fn default_bollinger_k() -> f64 {
    StrategyDefaults::default().bollinger_k
}

fn default_double_seven_lookback() -> usize {
    StrategyDefaults::default().double_seven_lookback
}

fn default_rsi_period() -> usize {
    StrategyDefaults::default().rsi_period
}

fn default_rsi_entry_ma() -> usize {
    StrategyDefaults::default().rsi_entry_ma
}

fn default_rsi_exit_ma() -> usize {
    StrategyDefaults::default().rsi_exit_ma
}

fn default_rsi_oversold() -> f64 {
    StrategyDefaults::default().rsi_oversold
}

fn default_vix_symbol() -> String {
    StrategyDefaults::default().vix_symbol
}

fn default_vix_period() -> usize {
    StrategyDefaults::default().vix_period
}

fn default_vix_spike() -> f64 {
    StrategyDefaults::default().vix_spike
}

fn default_vix_trend_period() -> usize {
    StrategyDefaults::default().vix_trend_period
}

// ─── Config enums ────────────────────────────────────────────────────

/// When the moving-average strategy is allowed to act.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaSchedule {
    /// Act on the bar where close crosses the average.
    #[default]
    Daily,
    /// Act only on the last bar of each calendar month, by level.
    MonthEnd,
}

impl fmt::Display for MaSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaSchedule::Daily => f.write_str("daily"),
            MaSchedule::MonthEnd => f.write_str("month_end"),
        }
    }
}

impl FromStr for MaSchedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "daily" => Ok(MaSchedule::Daily),
            "month_end" | "monthly" => Ok(MaSchedule::MonthEnd),
            other => Err(ConfigError::InvalidStrategyConfig {
                strategy: "moving_average",
                reason: format!("unknown schedule '{other}' (expected daily or month_end)"),
            }),
        }
    }
}

/// A strategy variant together with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// Buy on the first bar and never sell. The benchmark.
    BuyAndHold,

    /// Close versus an N-day simple moving average.
    MovingAverage {
        #[serde(default = "default_ma_period")]
        period: usize,
        #[serde(default)]
        schedule: MaSchedule,
    },

    /// Buy below mean - k·σ, sell back at the mean.
    Bollinger {
        #[serde(default = "default_bollinger_window")]
        window: usize,
        #[serde(default = "default_bollinger_k")]
        k: f64,
    },

    /// Buy at an N-bar closing low, sell at an N-bar closing high.
    DoubleSeven {
        #[serde(default = "default_double_seven_lookback")]
        lookback: usize,
        #[serde(default)]
        trend_period: Option<usize>,
    },

    /// Short-period RSI dip inside a long-term uptrend, exit on a cross of a
    /// short average.
    Rsi2 {
        #[serde(default = "default_rsi_period")]
        rsi_period: usize,
        #[serde(default = "default_rsi_entry_ma")]
        entry_ma: usize,
        #[serde(default = "default_rsi_exit_ma")]
        exit_ma: usize,
        #[serde(default = "default_rsi_oversold")]
        oversold: f64,
    },

    /// Month-end entry while a volatility index trades more than `spike`
    /// above its own average, gated by a long trend SMA.
    VixMa {
        #[serde(default = "default_vix_symbol")]
        vix_symbol: String,
        #[serde(default = "default_vix_period")]
        vix_period: usize,
        #[serde(default = "default_vix_spike")]
        spike: f64,
        #[serde(default = "default_vix_trend_period")]
        trend_period: usize,
    },
}

impl StrategyConfig {
    /// Every accepted strategy name, in display order.
    pub const NAMES: [&'static str; 6] = [
        "buy_and_hold",
        "moving_average",
        "bollinger",
        "double_seven",
        "rsi2",
        "vix_ma",
    ];

    /// Select a strategy by name with the given default parameters.
    ///
    /// Accepts a few aliases (`sma`, `bbands`, `double7`, `rsi`, `vix`). Anything
    /// else is `UnknownStrategy`.
    pub fn from_name(name: &str, defaults: &StrategyDefaults) -> Result<Self, ConfigError> {
        let key = name.trim().to_ascii_lowercase().replace('-', "_");
        let config = match key.as_str() {
            "buy_and_hold" | "buyandhold" | "benchmark" => StrategyConfig::BuyAndHold,
            "moving_average" | "ma" | "sma" => StrategyConfig::MovingAverage {
                period: defaults.ma_period,
                schedule: defaults.ma_schedule,
            },
            "bollinger" | "bbands" => StrategyConfig::Bollinger {
                window: defaults.bollinger_window,
                k: defaults.bollinger_k,
            },
            "double_seven" | "double7" => StrategyConfig::DoubleSeven {
                lookback: defaults.double_seven_lookback,
                trend_period: defaults.double_seven_trend_period,
            },
            "rsi2" | "rsi" => StrategyConfig::Rsi2 {
                rsi_period: defaults.rsi_period,
                entry_ma: defaults.rsi_entry_ma,
                exit_ma: defaults.rsi_exit_ma,
                oversold: defaults.rsi_oversold,
            },
            "vix_ma" | "vix" | "vix10" => StrategyConfig::VixMa {
                vix_symbol: defaults.vix_symbol.clone(),
                vix_period: defaults.vix_period,
                spike: defaults.vix_spike,
                trend_period: defaults.vix_trend_period,
            },
            _ => return Err(ConfigError::UnknownStrategy(name.to_string())),
        };
        Ok(config)
    }

    /// Machine name, matching the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::BuyAndHold => "buy_and_hold",
            StrategyConfig::MovingAverage { .. } => "moving_average",
            StrategyConfig::Bollinger { .. } => "bollinger",
            StrategyConfig::DoubleSeven { .. } => "double_seven",
            StrategyConfig::Rsi2 { .. } => "rsi2",
            StrategyConfig::VixMa { .. } => "vix_ma",
        }
    }

    /// Title-case name used in output file names.
    pub fn label(&self) -> &'static str {
        match self {
            StrategyConfig::BuyAndHold => "BuyAndHold",
            StrategyConfig::MovingAverage { .. } => "MovingAverage",
            StrategyConfig::Bollinger { .. } => "Bollinger",
            StrategyConfig::DoubleSeven { .. } => "DoubleSeven",
            StrategyConfig::Rsi2 { .. } => "Rsi2",
            StrategyConfig::VixMa { .. } => "VixMa",
        }
    }

    /// Parameters as `key=value` pairs separated by spaces. Empty for
    /// buy-and-hold.
    pub fn params(&self) -> String {
        match self {
            StrategyConfig::BuyAndHold => String::new(),
            StrategyConfig::MovingAverage { period, schedule } => {
                format!("period={period} schedule={schedule}")
            }
            StrategyConfig::Bollinger { window, k } => format!("window={window} k={k}"),
            StrategyConfig::DoubleSeven {
                lookback,
                trend_period,
            } => match trend_period {
                Some(t) => format!("lookback={lookback} trend_period={t}"),
                None => format!("lookback={lookback}"),
            },
            StrategyConfig::Rsi2 {
                rsi_period,
                entry_ma,
                exit_ma,
                oversold,
            } => format!(
                "rsi_period={rsi_period} entry_ma={entry_ma} exit_ma={exit_ma} oversold={oversold}"
            ),
            StrategyConfig::VixMa {
                vix_symbol,
                vix_period,
                spike,
                trend_period,
            } => format!(
                "vix_symbol={vix_symbol} vix_period={vix_period} spike={spike} trend_period={trend_period}"
            ),
        }
    }

    /// Bars of history the longest window needs before it can emit a signal.
    ///
    /// Series shorter than this evaluate to all-HOLD.
    pub fn warmup_bars(&self) -> usize {
        match self {
            StrategyConfig::BuyAndHold => 1,
            StrategyConfig::MovingAverage { period, .. } => *period,
            StrategyConfig::Bollinger { window, .. } => *window,
            StrategyConfig::DoubleSeven {
                lookback,
                trend_period,
            } => (*lookback).max(trend_period.unwrap_or(0)),
            StrategyConfig::Rsi2 {
                rsi_period,
                entry_ma,
                exit_ma,
                ..
            } => (*entry_ma).max(rsi_period + 1).max(exit_ma + 1),
            StrategyConfig::VixMa {
                vix_period,
                trend_period,
                ..
            } => (*trend_period).max(*vix_period),
        }
    }

    /// Symbol of the second series this strategy reads, if any.
    pub fn auxiliary_symbol(&self) -> Option<&str> {
        match self {
            StrategyConfig::VixMa { vix_symbol, .. } => Some(vix_symbol),
            _ => None,
        }
    }

    /// Reject out-of-range parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let strategy = self.name();
        let invalid = |reason: String| ConfigError::InvalidStrategyConfig { strategy, reason };

        match self {
            StrategyConfig::BuyAndHold => Ok(()),
            StrategyConfig::MovingAverage { period, .. } => {
                if *period == 0 {
                    return Err(invalid("period must be >= 1".into()));
                }
                Ok(())
            }
            StrategyConfig::Bollinger { window, k } => {
                if *window == 0 {
                    return Err(invalid("window must be >= 1".into()));
                }
                if !k.is_finite() || *k <= 0.0 {
                    return Err(invalid(format!("k must be finite and > 0, got {k}")));
                }
                Ok(())
            }
            StrategyConfig::DoubleSeven {
                lookback,
                trend_period,
            } => {
                if *lookback < 2 {
                    return Err(invalid(format!("lookback must be >= 2, got {lookback}")));
                }
                if *trend_period == Some(0) {
                    return Err(invalid("trend_period must be >= 1".into()));
                }
                Ok(())
            }
            StrategyConfig::Rsi2 {
                rsi_period,
                entry_ma,
                exit_ma,
                oversold,
            } => {
                if *rsi_period == 0 || *entry_ma == 0 || *exit_ma == 0 {
                    return Err(invalid(
                        "rsi_period, entry_ma and exit_ma must all be >= 1".into(),
                    ));
                }
                if !(0.0..=100.0).contains(oversold) {
                    return Err(invalid(format!(
                        "oversold must be within [0, 100], got {oversold}"
                    )));
                }
                Ok(())
            }
            StrategyConfig::VixMa {
                vix_symbol,
                vix_period,
                spike,
                trend_period,
            } => {
                if vix_symbol.trim().is_empty() {
                    return Err(invalid("vix_symbol must not be empty".into()));
                }
                if *vix_period == 0 || *trend_period == 0 {
                    return Err(invalid("vix_period and trend_period must be >= 1".into()));
                }
                if !spike.is_finite() || *spike < 0.0 {
                    return Err(invalid(format!("spike must be finite and >= 0, got {spike}")));
                }
                Ok(())
            }
        }
    }
}

impl FromStr for StrategyConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyConfig::from_name(s, &StrategyDefaults::default())
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self.params();
        if params.is_empty() {
            f.write_str(self.name())
        } else {
            write!(f, "{}({params})", self.name())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_uses_defaults() {
        let config: StrategyConfig = "moving_average".parse().unwrap();
        assert_eq!(
            config,
            StrategyConfig::MovingAverage {
                period: 200,
                schedule: MaSchedule::Daily
            }
        );

        let config: StrategyConfig = "bollinger".parse().unwrap();
        assert_eq!(config, StrategyConfig::Bollinger { window: 40, k: 2.0 });
    }

    #[test]
    fn from_name_aliases() {
        assert_eq!("SMA".parse::<StrategyConfig>().unwrap().name(), "moving_average");
        assert_eq!("double-seven".parse::<StrategyConfig>().unwrap().name(), "double_seven");
        assert_eq!("bbands".parse::<StrategyConfig>().unwrap().name(), "bollinger");
    }

    #[test]
    fn unknown_name_rejected() {
        let err = "martingale".parse::<StrategyConfig>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownStrategy("martingale".into()));
        assert!(err.to_string().contains("double_seven"));
    }

    #[test]
    fn serde_tagged_roundtrip() {
        let config = StrategyConfig::DoubleSeven {
            lookback: 7,
            trend_period: Some(200),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"type\":\"double_seven\""));
        let back: StrategyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn serde_fills_missing_params() {
        let config: StrategyConfig = serde_json::from_str(r#"{"type":"bollinger","k":1.5}"#).unwrap();
        assert_eq!(config, StrategyConfig::Bollinger { window: 40, k: 1.5 });

        let config: StrategyConfig =
            serde_json::from_str(r#"{"type":"moving_average","schedule":"month_end"}"#).unwrap();
        assert_eq!(
            config,
            StrategyConfig::MovingAverage {
                period: 200,
                schedule: MaSchedule::MonthEnd
            }
        );
    }

    #[test]
    fn serde_rejects_unknown_type() {
        let result: Result<StrategyConfig, _> = serde_json::from_str(r#"{"type":"martingale"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_params() {
        let bad = [
            StrategyConfig::MovingAverage {
                period: 0,
                schedule: MaSchedule::Daily,
            },
            StrategyConfig::Bollinger { window: 0, k: 2.0 },
            StrategyConfig::Bollinger { window: 20, k: -1.0 },
            StrategyConfig::Bollinger {
                window: 20,
                k: f64::NAN,
            },
            StrategyConfig::DoubleSeven {
                lookback: 1,
                trend_period: None,
            },
            StrategyConfig::DoubleSeven {
                lookback: 7,
                trend_period: Some(0),
            },
            StrategyConfig::Rsi2 {
                rsi_period: 2,
                entry_ma: 200,
                exit_ma: 5,
                oversold: 101.0,
            },
            StrategyConfig::VixMa {
                vix_symbol: " ".into(),
                vix_period: 10,
                spike: 0.05,
                trend_period: 200,
            },
            StrategyConfig::VixMa {
                vix_symbol: "^VIX".into(),
                vix_period: 10,
                spike: -0.1,
                trend_period: 200,
            },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidStrategyConfig { .. })),
                "expected rejection for {config}"
            );
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        for name in StrategyConfig::NAMES {
            let config: StrategyConfig = name.parse().unwrap();
            assert!(config.validate().is_ok(), "{name} defaults should validate");
            assert_eq!(config.name(), name);
        }
    }

    #[test]
    fn warmup_is_longest_window() {
        assert_eq!(StrategyConfig::BuyAndHold.warmup_bars(), 1);
        assert_eq!("moving_average".parse::<StrategyConfig>().unwrap().warmup_bars(), 200);
        assert_eq!(
            StrategyConfig::DoubleSeven {
                lookback: 7,
                trend_period: Some(200)
            }
            .warmup_bars(),
            200
        );
        assert_eq!("rsi2".parse::<StrategyConfig>().unwrap().warmup_bars(), 200);
    }

    #[test]
    fn params_and_display() {
        let config = StrategyConfig::Bollinger { window: 40, k: 2.0 };
        assert_eq!(config.params(), "window=40 k=2");
        assert_eq!(config.to_string(), "bollinger(window=40 k=2)");
        assert_eq!(StrategyConfig::BuyAndHold.to_string(), "buy_and_hold");
    }

    #[test]
    fn volatility_strategy_names_its_series() {
        let config: StrategyConfig = "vix".parse().unwrap();
        assert_eq!(config.auxiliary_symbol(), Some("^VIX"));
        assert_eq!(config.warmup_bars(), 200);
        assert_eq!(
            config.params(),
            "vix_symbol=^VIX vix_period=10 spike=0.05 trend_period=200"
        );
        assert_eq!(StrategyConfig::BuyAndHold.auxiliary_symbol(), None);

        let config: StrategyConfig =
            serde_json::from_str(r#"{"type":"vix_ma","vix_symbol":"^VXN"}"#).unwrap();
        assert_eq!(config.auxiliary_symbol(), Some("^VXN"));
        assert_eq!(config.label(), "VixMa");
    }

    #[test]
    fn schedule_parsing() {
        assert_eq!("month-end".parse::<MaSchedule>().unwrap(), MaSchedule::MonthEnd);
        assert_eq!("daily".parse::<MaSchedule>().unwrap(), MaSchedule::Daily);
        assert!("weekly".parse::<MaSchedule>().is_err());
    }
}
