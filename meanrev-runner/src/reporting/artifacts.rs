//! Artifact manager for persisting run outputs.
//!
//! Per run, under the output directory:
//! - `runs.csv` — one appended log record
//! - `{Strategy}_{TICKER}_({start}-{end})_{params}.json` — the JSON run log
//! - the same stem with `.svg` and `.txt` — charts, unless disabled

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::chart::EquityChart;
use super::json_log::{write_json_log, JsonRunLog};
use super::log_record::{append_run_log, LogRecord};
use crate::runner::RunReport;

pub const SVG_SIZE: (u32, u32) = (1000, 500);
pub const TEXT_SIZE: (u16, u16) = (100, 28);

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_log: PathBuf,
    pub json_log: PathBuf,
    pub chart_svg: Option<PathBuf>,
    pub chart_text: Option<PathBuf>,
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
    charts: bool,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create output dir {}", output_dir.display()))?;
        Ok(Self {
            output_dir,
            charts: true,
        })
    }

    pub fn with_charts(mut self, charts: bool) -> Self {
        self.charts = charts;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save the complete artifact set for one run.
    pub fn save_run(&self, report: &RunReport, run_date: NaiveDate) -> Result<ArtifactPaths> {
        let run_log = append_run_log(&self.output_dir, &LogRecord::from_report(report))?;

        let log = JsonRunLog::from_report(report, run_date);
        let json_log = write_json_log(&self.output_dir, &log)?;

        let (chart_svg, chart_text) = if self.charts {
            let chart = EquityChart::from_report(report);
            let svg = json_log.with_extension("svg");
            let txt = json_log.with_extension("txt");
            chart.write_svg(&svg, SVG_SIZE.0, SVG_SIZE.1)?;
            chart.write_text(&txt, TEXT_SIZE.0, TEXT_SIZE.1)?;
            (Some(svg), Some(txt))
        } else {
            (None, None)
        };

        Ok(ArtifactPaths {
            run_log,
            json_log,
            chart_svg,
            chart_text,
        })
    }
}
