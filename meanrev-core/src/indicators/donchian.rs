//! Donchian channel: highest or lowest close in a trailing window.
//!
//! Produces two series (exposed as separate Indicator instances):
//! - Upper: max(close[t-period+1..=t])
//! - Lower: min(close[t-period+1..=t])
//!
//! Lookback: period - 1.

use super::Indicator;

/// Which edge of the channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn upper(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: DonchianBand::Upper,
            name: format!("donchian_upper_{period}"),
        }
    }

    pub fn lower(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: DonchianBand::Lower,
            name: format!("donchian_lower_{period}"),
        }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &closes[(i + 1 - self.period)..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }
            result[i] = match self.band {
                DonchianBand::Upper => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                DonchianBand::Lower => window.iter().copied().fold(f64::INFINITY, f64::min),
            };
        }

        result
    }
}
