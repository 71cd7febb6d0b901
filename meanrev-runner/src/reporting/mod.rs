//! Reporting — run log, JSON logs, log comparison, charts and console output.

pub mod artifacts;
pub mod chart;
pub mod json_log;
pub mod log_record;
pub mod summarize;
pub mod summary;

pub use artifacts::{ArtifactManager, ArtifactPaths};
pub use chart::EquityChart;
pub use json_log::{json_log_name, read_json_log, write_json_log, JsonRunLog};
pub use log_record::{append_run_log, read_run_log, LogRecord, RUN_LOG_FILE};
pub use summarize::ComparisonTable;
pub use summary::{format_batch, format_summary};
