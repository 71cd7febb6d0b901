//! The fixed-schema run log: `ticker,strategy,params,final_return,benchmark_return`.
//!
//! One row per run, returns in percent, appended to `{output}/runs.csv`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::runner::RunReport;

pub const RUN_LOG_FILE: &str = "runs.csv";
pub const RUN_LOG_HEADER: [&str; 5] = [
    "ticker",
    "strategy",
    "params",
    "final_return",
    "benchmark_return",
];

/// One row of the run log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ticker: String,
    pub strategy: String,
    pub params: String,
    /// Percent.
    pub final_return: f64,
    /// Percent.
    pub benchmark_return: f64,
}

impl LogRecord {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            ticker: report.config.ticker.to_ascii_uppercase(),
            strategy: report.config.strategy.name().to_string(),
            params: report.config.strategy.params(),
            final_return: round2(report.result.final_return * 100.0),
            benchmark_return: round2(report.result.benchmark_return * 100.0),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticker={} strategy={} params=[{}] final_return={:.2}% benchmark_return={:.2}%",
            self.ticker, self.strategy, self.params, self.final_return, self.benchmark_return
        )
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Append `record` to `{dir}/runs.csv`, writing the header only for a new file.
///
/// The record is also emitted at info level.
pub fn append_run_log(dir: &Path, record: &LogRecord) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir {}", dir.display()))?;
    let path = dir.join(RUN_LOG_FILE);
    let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open run log {}", path.display()))?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    wtr.serialize(record)
        .with_context(|| format!("failed to append to {}", path.display()))?;
    wtr.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    log::info!("{record}");
    Ok(path)
}

/// Read every row of a run log.
pub fn read_run_log(path: &Path) -> Result<Vec<LogRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open run log {}", path.display()))?;
    rdr.deserialize()
        .collect::<Result<Vec<LogRecord>, _>>()
        .with_context(|| format!("malformed run log {}", path.display()))
}
