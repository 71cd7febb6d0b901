//! Console summary of a run.

use std::fmt::Write;

use crate::batch::BatchOutcome;
use crate::runner::RunReport;

/// Multi-line human-readable summary of one run.
pub fn format_summary(report: &RunReport) -> String {
    let config = &report.config;
    let m = &report.metrics;
    let t = &report.trade_stats;
    let mut out = String::new();

    let _ = writeln!(out, "=== Backtest Result ===");
    let _ = writeln!(out, "Ticker:          {}", config.ticker.to_ascii_uppercase());
    let _ = writeln!(out, "Strategy:        {}", config.strategy);
    let _ = writeln!(
        out,
        "Period:          {} to {}",
        report.first_date, report.last_date
    );
    let _ = writeln!(
        out,
        "Bars:            {} ({} warmup)",
        report.bar_count,
        report.warmup_bars()
    );
    let _ = writeln!(
        out,
        "Signals:         {} buy / {} sell",
        report.signals.buy_count(),
        report.signals.sell_count()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "--- Performance ---");
    let _ = writeln!(out, "Initial Capital: ${:.2}", config.initial_capital);
    let _ = writeln!(out, "Final Value:     ${:.2}", report.result.final_value());
    let _ = writeln!(out, "Total Return:    {:.2}%", m.total_return * 100.0);
    let _ = writeln!(out, "Buy & Hold:      {:.2}%", m.benchmark_return * 100.0);
    let _ = writeln!(out, "Excess Return:   {:.2}%", m.excess_return * 100.0);
    let _ = writeln!(out, "CAGR:            {:.2}%", m.cagr * 100.0);
    let _ = writeln!(out, "Sharpe:          {:.3}", m.sharpe);
    let _ = writeln!(out, "Max Drawdown:    {:.2}%", m.max_drawdown * 100.0);
    let _ = writeln!(out, "Longest DD:      {} bars", m.longest_drawdown_bars);
    let _ = writeln!(out);
    let _ = writeln!(out, "--- Trades ---");
    let _ = writeln!(out, "Closed Trades:   {}", t.count);
    if let Some(all) = &t.all {
        let _ = writeln!(out, "Win Rate:        {:.1}%", t.win_rate * 100.0);
        let _ = writeln!(out, "Profit Factor:   {:.2}", t.profit_factor);
        let _ = writeln!(out, "Avg Profit:      ${:.2}", all.avg_profit);
        let _ = writeln!(out, "Avg Return:      {:.2}%", all.avg_return * 100.0);
        let _ = writeln!(
            out,
            "Best / Worst:    {:.2}% / {:.2}%",
            all.max_return * 100.0,
            all.min_return * 100.0
        );
    }
    if let Some(open) = &report.result.open_position {
        let _ = writeln!(
            out,
            "Open Position:   {:.4} shares since {} (unrealized ${:.2})",
            open.quantity,
            open.entry_date,
            open.unrealized_profit()
        );
    }
    out
}

/// Fixed-width table of a batch, one line per run plus failures.
pub fn format_batch(outcome: &BatchOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:<14} {:<24} {:>10} {:>10} {:>8} {:>9} {:>7}",
        "Ticker", "Strategy", "Params", "Return %", "B&H %", "Sharpe", "MaxDD %", "Trades"
    );
    let _ = writeln!(out, "{}", "-".repeat(97));
    for r in &outcome.reports {
        let _ = writeln!(
            out,
            "{:<8} {:<14} {:<24} {:>10.2} {:>10.2} {:>8.3} {:>9.2} {:>7}",
            r.config.ticker.to_ascii_uppercase(),
            r.config.strategy.label(),
            r.config.strategy.params(),
            r.result.final_return * 100.0,
            r.result.benchmark_return * 100.0,
            r.metrics.sharpe,
            r.metrics.max_drawdown * 100.0,
            r.trade_stats.count
        );
    }
    for f in &outcome.failures {
        let _ = writeln!(
            out,
            "FAILED run {} ({} {}): {}",
            f.index + 1,
            f.ticker,
            f.strategy,
            f.error
        );
    }
    out
}
