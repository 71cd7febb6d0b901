//! Equity chart — strategy vs. buy-and-hold on a shared date axis.
//!
//! Two renderings of the same data:
//! - text: ratatui's `Chart` widget drawn into an off-screen `Buffer`
//! - SVG: a standalone image file

use anyhow::{Context, Result};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};
use std::fs;
use std::path::Path;

use crate::runner::RunReport;
use crate::simulate::EquityPoint;

const STRATEGY_COLOR: &str = "#1f77b4";
const BENCHMARK_COLOR: &str = "#ff7f0e";

/// Strategy and benchmark equity curves for one run.
pub struct EquityChart<'a> {
    title: String,
    strategy_label: String,
    strategy: &'a [EquityPoint],
    benchmark: &'a [EquityPoint],
}

/// Axis extents shared by both renderings.
#[derive(Debug, Clone, Copy)]
struct Extent {
    x_max: f64,
    y_lower: f64,
    y_upper: f64,
}

impl<'a> EquityChart<'a> {
    pub fn new(
        title: impl Into<String>,
        strategy_label: impl Into<String>,
        strategy: &'a [EquityPoint],
        benchmark: &'a [EquityPoint],
    ) -> Self {
        Self {
            title: title.into(),
            strategy_label: strategy_label.into(),
            strategy,
            benchmark,
        }
    }

    pub fn from_report(report: &'a RunReport) -> Self {
        let config = &report.config;
        Self::new(
            format!(
                "{} {} ({} to {})",
                config.ticker.to_ascii_uppercase(),
                config.strategy,
                report.first_date,
                report.last_date
            ),
            config.strategy.label(),
            &report.result.equity_curve,
            &report.result.benchmark_curve,
        )
    }

    /// Dates along the x axis; the longer curve wins.
    fn dates(&self) -> &[EquityPoint] {
        if self.strategy.len() >= self.benchmark.len() {
            self.strategy
        } else {
            self.benchmark
        }
    }

    fn extent(&self) -> Option<Extent> {
        let len = self.strategy.len().max(self.benchmark.len());
        if len == 0 {
            return None;
        }
        let (lo, hi) = self
            .strategy
            .iter()
            .chain(self.benchmark.iter())
            .map(|p| p.value)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        let range = hi - lo;
        let pad = if range > 0.0 { range * 0.05 } else { lo.abs().max(1.0) * 0.05 };
        Some(Extent {
            x_max: (len - 1).max(1) as f64,
            y_lower: lo - pad,
            y_upper: hi + pad,
        })
    }

    /// First, middle and last dates.
    fn date_labels(&self) -> Vec<String> {
        let dates = self.dates();
        match dates.len() {
            0 => Vec::new(),
            1 => vec![dates[0].date.to_string()],
            n => vec![
                dates[0].date.to_string(),
                dates[(n - 1) / 2].date.to_string(),
                dates[n - 1].date.to_string(),
            ],
        }
    }

    // ── Text ──

    /// Render into an off-screen buffer and return its rows, right-trimmed.
    pub fn render_text(&self, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        self.render(area, &mut buf);

        let mut out = String::new();
        for y in 0..area.height {
            let mut row = String::new();
            for x in 0..area.width {
                if let Some(cell) = buf.cell((x, y)) {
                    row.push_str(cell.symbol());
                }
            }
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }

    pub fn write_text(&self, path: &Path, width: u16, height: u16) -> Result<()> {
        fs::write(path, self.render_text(width, height))
            .with_context(|| format!("failed to write {}", path.display()))
    }

    // ── SVG ──

    pub fn to_svg(&self, width: u32, height: u32) -> String {
        let (w, h) = (width as f64, height as f64);
        let (left, right, top, bottom) = (80.0, 20.0, 40.0, 50.0);
        let plot_w = (w - left - right).max(1.0);
        let plot_h = (h - top - bottom).max(1.0);

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" font-family=\"sans-serif\" font-size=\"12\">\n"
        );
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"15\">{}</text>\n",
            w / 2.0,
            xml_escape(&self.title)
        ));

        let Some(ext) = self.extent() else {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">No data</text>\n</svg>\n",
                w / 2.0,
                h / 2.0
            ));
            return svg;
        };

        let sx = |i: usize| left + i as f64 / ext.x_max * plot_w;
        let sy = |v: f64| top + (ext.y_upper - v) / (ext.y_upper - ext.y_lower) * plot_h;

        // Axes
        svg.push_str(&format!(
            "<polyline fill=\"none\" stroke=\"black\" points=\"{left:.1},{top:.1} {left:.1},{:.1} {:.1},{:.1}\"/>\n",
            top + plot_h,
            left + plot_w,
            top + plot_h
        ));

        // Y ticks: lower, middle, upper
        let y_mid = (ext.y_lower + ext.y_upper) / 2.0;
        for v in [ext.y_lower, y_mid, ext.y_upper] {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">${v:.0}</text>\n",
                left - 6.0,
                sy(v) + 4.0
            ));
        }

        // X ticks: dates at first, middle, last bar
        let dates = self.dates();
        let n = dates.len();
        let ticks = if n > 1 { vec![0, (n - 1) / 2, n - 1] } else { vec![0] };
        for i in ticks {
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n",
                sx(i),
                top + plot_h + 18.0,
                dates[i].date
            ));
        }

        for (points, color) in [
            (self.benchmark, BENCHMARK_COLOR),
            (self.strategy, STRATEGY_COLOR),
        ] {
            let coords: Vec<String> = points
                .iter()
                .enumerate()
                .map(|(i, p)| format!("{:.2},{:.2}", sx(i), sy(p.value)))
                .collect();
            svg.push_str(&format!(
                "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" points=\"{}\"/>\n",
                coords.join(" ")
            ));
        }

        // Legend
        let legend = [
            (xml_escape(&self.strategy_label), STRATEGY_COLOR),
            ("Buy &amp; Hold".to_string(), BENCHMARK_COLOR),
        ];
        for (row, (label, color)) in legend.iter().enumerate() {
            let y = top + 12.0 + row as f64 * 16.0;
            svg.push_str(&format!(
                "<line x1=\"{:.1}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"{color}\" stroke-width=\"2\"/>\n",
                left + 10.0,
                left + 30.0
            ));
            svg.push_str(&format!(
                "<text x=\"{:.1}\" y=\"{:.1}\">{label}</text>\n",
                left + 36.0,
                y + 4.0
            ));
        }

        svg.push_str("</svg>\n");
        svg
    }

    pub fn write_svg(&self, path: &Path, width: u32, height: u32) -> Result<()> {
        fs::write(path, self.to_svg(width, height))
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

impl Widget for &EquityChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL);

        let Some(ext) = self.extent() else {
            Paragraph::new("No data").block(block).render(area, buf);
            return;
        };

        let strategy_data: Vec<(f64, f64)> = self
            .strategy
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.value))
            .collect();
        let benchmark_data: Vec<(f64, f64)> = self
            .benchmark
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.value))
            .collect();

        let datasets = vec![
            Dataset::default()
                .name(self.strategy_label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&strategy_data),
            Dataset::default()
                .name("Buy & Hold")
                .marker(symbols::Marker::Dot)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Yellow))
                .data(&benchmark_data),
        ];

        let x_labels: Vec<Span> = self.date_labels().into_iter().map(Span::raw).collect();
        let y_mid = (ext.y_lower + ext.y_upper) / 2.0;
        let y_labels = vec![
            Span::raw(format!("${:.0}", ext.y_lower)),
            Span::raw(format!("${:.0}", y_mid)),
            Span::raw(format!("${:.0}", ext.y_upper)),
        ];

        Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("Date")
                    .bounds([0.0, ext.x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .title("Equity")
                    .bounds([ext.y_lower, ext.y_upper])
                    .labels(y_labels),
            )
            .render(area, buf);
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
