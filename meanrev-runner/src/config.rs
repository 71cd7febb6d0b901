//! Run and batch configuration.
//!
//! A `RunConfig` is everything one backtest needs: ticker, strategy, date
//! range and account settings. Batch files are TOML with a `[defaults]`
//! table and one `[[run]]` table per backtest:
//!
//! ```toml
//! [defaults]
//! start_date = "2019-01-01"
//! end_date = "2022-03-17"
//! initial_capital = 10000.0
//!
//! [[run]]
//! ticker = "SPY"
//! strategy = { type = "moving_average", period = 200 }
//! ```

use chrono::NaiveDate;
use meanrev_core::{ConfigError, StrategyConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unique identifier for a run (content hash of its config).
pub type RunId = String;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 10_000.0;

fn default_initial_capital() -> f64 {
    DEFAULT_INITIAL_CAPITAL
}

fn default_require_full_history() -> bool {
    true
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub ticker: String,
    pub strategy: StrategyConfig,
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Annual risk-free rate used by the Sharpe ratio, as a fraction.
    #[serde(default)]
    pub risk_free_rate: f64,
    /// Abort when the series is shorter than the strategy's warmup.
    #[serde(default = "default_require_full_history")]
    pub require_full_history: bool,
}

impl RunConfig {
    pub fn new(
        ticker: impl Into<String>,
        strategy: StrategyConfig,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            strategy,
            start_date,
            end_date,
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            risk_free_rate: 0.0,
            require_full_history: true,
        }
    }

    pub fn with_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_full_history(mut self, required: bool) -> Self {
        self.require_full_history = required;
        self
    }

    /// Reject the config before any data is fetched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::EmptyTicker);
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(ConfigError::InvalidCapital(self.initial_capital));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ConfigError::Parse(format!(
                "risk-free rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        self.strategy.validate()
    }

    /// Deterministic hash of every field that affects the result.
    ///
    /// Two runs with identical configs share a `RunId`.
    pub fn run_id(&self) -> RunId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.ticker.to_ascii_uppercase().as_bytes());
        hasher.update(self.strategy.to_string().as_bytes());
        hasher.update(self.start_date.to_string().as_bytes());
        hasher.update(self.end_date.to_string().as_bytes());
        hasher.update(&self.initial_capital.to_le_bytes());
        hasher.update(&self.risk_free_rate.to_le_bytes());
        hasher.update(&[self.require_full_history as u8]);
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..16].to_string()
    }
}

// ─── Batch files ─────────────────────────────────────────────────────

/// Values shared by every `[[run]]` that does not override them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchDefaults {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub initial_capital: Option<f64>,
    pub risk_free_rate: Option<f64>,
    pub require_full_history: Option<bool>,
}

/// One `[[run]]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRun {
    pub ticker: String,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub initial_capital: Option<f64>,
    #[serde(default)]
    pub risk_free_rate: Option<f64>,
    #[serde(default)]
    pub require_full_history: Option<bool>,
}

/// A parsed batch file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub defaults: BatchDefaults,
    #[serde(default, rename = "run")]
    pub runs: Vec<BatchRun>,
}

impl BatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(format!("batch TOML: {e}")))
    }

    /// Resolve every run against the defaults and validate it, in file order.
    ///
    /// A run that is missing a date or does not validate is an `Err` in its
    /// own slot; the other runs are unaffected. Nothing here touches a
    /// data provider.
    pub fn resolve_runs(&self) -> Vec<Result<RunConfig, ConfigError>> {
        self.runs
            .iter()
            .enumerate()
            .map(|(i, run)| self.resolve(i, run))
            .collect()
    }

    fn resolve(&self, index: usize, run: &BatchRun) -> Result<RunConfig, ConfigError> {
        let missing = |field: &str| {
            ConfigError::Parse(format!(
                "run {} ({}): missing {field} and no default",
                index + 1,
                run.ticker
            ))
        };
        let config = RunConfig {
            ticker: run.ticker.clone(),
            strategy: run.strategy.clone(),
            start_date: run
                .start_date
                .or(self.defaults.start_date)
                .ok_or_else(|| missing("start_date"))?,
            end_date: run
                .end_date
                .or(self.defaults.end_date)
                .ok_or_else(|| missing("end_date"))?,
            initial_capital: run
                .initial_capital
                .or(self.defaults.initial_capital)
                .unwrap_or(DEFAULT_INITIAL_CAPITAL),
            risk_free_rate: run
                .risk_free_rate
                .or(self.defaults.risk_free_rate)
                .unwrap_or(0.0),
            require_full_history: run
                .require_full_history
                .or(self.defaults.require_full_history)
                .unwrap_or(true),
        };
        config.validate()?;
        Ok(config)
    }
}
