//! MeanRev CLI — fetch, run, compare and summarize commands.
//!
//! Commands:
//! - `fetch`: download daily bars from Yahoo Finance into the CSV cache
//! - `run`: backtest one strategy on one ticker and write its artifacts
//! - `compare`: run every `[[run]]` of a batch TOML file and tabulate them
//! - `summarize`: combine JSON run logs into one wide CSV table

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use meanrev_core::data::{CachedProvider, CsvCache, SyntheticProvider, YahooProvider};
use meanrev_core::{DataProvider, MaSchedule, StrategyConfig, StrategyDefaults};
use meanrev_runner::reporting::artifacts::TEXT_SIZE;
use meanrev_runner::reporting::{
    format_batch, format_summary, ArtifactManager, ComparisonTable, EquityChart,
};
use meanrev_runner::{run_batch_file, BatchConfig, RunConfig, Runner};

#[derive(Parser)]
#[command(
    name = "meanrev",
    version,
    about = "MeanRev Lab — mean-reversion backtesting toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily bars from Yahoo Finance into the CSV cache.
    Fetch {
        /// Tickers to download (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Cache directory.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Backtest one strategy on one ticker.
    Run(RunArgs),
    /// Run a batch of backtests from a TOML file.
    Compare {
        /// Batch file with [defaults] and [[run]] tables.
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Combine JSON run logs into one CSV table.
    Summarize {
        /// JSON run logs to combine.
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// Output CSV path.
        #[arg(long, default_value = "backtests/comparison.csv")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Ticker symbol.
    #[arg(long)]
    ticker: String,

    /// Strategy: buy_and_hold, moving_average, bollinger, double_seven, rsi2, vix_ma.
    #[arg(long)]
    strategy: String,

    /// Moving average period.
    #[arg(long)]
    period: Option<usize>,

    /// Moving average schedule: daily or month_end.
    #[arg(long)]
    schedule: Option<MaSchedule>,

    /// Bollinger window.
    #[arg(long)]
    window: Option<usize>,

    /// Bollinger band width in standard deviations.
    #[arg(long)]
    k: Option<f64>,

    /// Double Seven lookback.
    #[arg(long)]
    lookback: Option<usize>,

    /// Trend filter period for Double Seven and the VIX strategy.
    #[arg(long)]
    trend_period: Option<usize>,

    /// RSI2 oscillator period.
    #[arg(long)]
    rsi_period: Option<usize>,

    /// RSI2 trend filter period.
    #[arg(long)]
    entry_ma: Option<usize>,

    /// RSI2 exit average period.
    #[arg(long)]
    exit_ma: Option<usize>,

    /// RSI2 oversold threshold.
    #[arg(long)]
    oversold: Option<f64>,

    /// Volatility index read by vix_ma.
    #[arg(long)]
    vix_symbol: Option<String>,

    /// vix_ma: period of the volatility index average.
    #[arg(long)]
    vix_period: Option<usize>,

    /// vix_ma: fraction above its average the index must trade to buy.
    #[arg(long)]
    spike: Option<f64>,

    /// Start date (YYYY-MM-DD).
    #[arg(long)]
    start: NaiveDate,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Initial capital.
    #[arg(long, default_value_t = 10_000.0)]
    capital: f64,

    /// Annual risk-free rate for the Sharpe ratio, as a fraction.
    #[arg(long, default_value_t = 0.0)]
    risk_free_rate: f64,

    /// Run even when the series is shorter than the strategy's warmup.
    #[arg(long, default_value_t = false)]
    allow_short_history: bool,

    #[command(flatten)]
    source: SourceArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct SourceArgs {
    /// Use a seeded random walk instead of Yahoo Finance.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Seed for --synthetic.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Always hit the network; never read or write the CSV cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Cache directory.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for run logs, JSON logs and charts.
    #[arg(long, default_value = "backtests")]
    output_dir: PathBuf,

    /// Skip chart files and the terminal chart.
    #[arg(long, default_value_t = false)]
    no_chart: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            tickers,
            start,
            end,
            data_dir,
        } => run_fetch(&tickers, start, end, &data_dir),
        Commands::Run(args) => run_backtest_cmd(args),
        Commands::Compare {
            config,
            source,
            output,
        } => run_compare(&config, &source, &output),
        Commands::Summarize { logs, out } => run_summarize(&logs, &out),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn run_fetch(
    tickers: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    data_dir: &Path,
) -> Result<()> {
    let end = end.unwrap_or_else(today);
    let start = start.unwrap_or_else(|| end - chrono::Duration::days(365 * 10));

    let provider = YahooProvider::new()?;
    let failed = fetch_into_cache(&provider, &CsvCache::new(data_dir), tickers, start, end);

    if !failed.is_empty() {
        bail!("failed to fetch {}", failed.join(", "));
    }
    Ok(())
}

/// Download and cache each ticker. Returns the tickers that failed either step.
fn fetch_into_cache(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<String> {
    let mut failed = Vec::new();

    for ticker in tickers {
        let stored = provider.fetch(ticker, start, end).and_then(|series| {
            let path = cache.store(&series, start, end)?;
            Ok((series.len(), path))
        });
        match stored {
            Ok((bars, path)) => println!("{ticker}: {bars} bars -> {}", path.display()),
            Err(e) => {
                eprintln!("Error for {ticker}: {e}");
                failed.push(ticker.clone());
            }
        }
    }

    failed
}

fn build_provider(source: &SourceArgs) -> Result<Box<dyn DataProvider>> {
    if source.synthetic {
        log::warn!("using synthetic data (seed {})", source.seed);
        return Ok(Box::new(SyntheticProvider::new(source.seed)));
    }
    let yahoo = YahooProvider::new()?;
    if source.no_cache {
        Ok(Box::new(yahoo))
    } else {
        Ok(Box::new(CachedProvider::new(
            yahoo,
            CsvCache::new(&source.data_dir),
        )))
    }
}

fn strategy_from_args(args: &RunArgs) -> Result<StrategyConfig> {
    let base = StrategyDefaults::default();
    let defaults = StrategyDefaults {
        ma_period: args.period.unwrap_or(base.ma_period),
        ma_schedule: args.schedule.unwrap_or(base.ma_schedule),
        bollinger_window: args.window.unwrap_or(base.bollinger_window),
        bollinger_k: args.k.unwrap_or(base.bollinger_k),
        double_seven_lookback: args.lookback.unwrap_or(base.double_seven_lookback),
        double_seven_trend_period: args.trend_period.or(base.double_seven_trend_period),
        rsi_period: args.rsi_period.unwrap_or(base.rsi_period),
        rsi_entry_ma: args.entry_ma.unwrap_or(base.rsi_entry_ma),
        rsi_exit_ma: args.exit_ma.unwrap_or(base.rsi_exit_ma),
        rsi_oversold: args.oversold.unwrap_or(base.rsi_oversold),
        vix_symbol: args.vix_symbol.clone().unwrap_or(base.vix_symbol),
        vix_period: args.vix_period.unwrap_or(base.vix_period),
        vix_spike: args.spike.unwrap_or(base.vix_spike),
        vix_trend_period: args.trend_period.unwrap_or(base.vix_trend_period),
    };
    Ok(StrategyConfig::from_name(&args.strategy, &defaults)?)
}

fn run_backtest_cmd(args: RunArgs) -> Result<()> {
    let strategy = strategy_from_args(&args)?;
    let config = RunConfig::new(
        args.ticker.clone(),
        strategy,
        args.start,
        args.end.unwrap_or_else(today),
    )
    .with_capital(args.capital)
    .with_risk_free_rate(args.risk_free_rate)
    .with_full_history(!args.allow_short_history);

    // Fail on a bad config before building an HTTP client
    config.validate()?;

    let runner = Runner::from_boxed(build_provider(&args.source)?);
    let report = runner
        .run(&config)
        .with_context(|| format!("backtest of {} failed", config.ticker))?;

    println!();
    print!("{}", format_summary(&report));

    if !args.output.no_chart {
        println!();
        let (width, height) = TEXT_SIZE;
        print!("{}", EquityChart::from_report(&report).render_text(width, height));
    }

    let manager = ArtifactManager::new(&args.output.output_dir)?.with_charts(!args.output.no_chart);
    let paths = manager.save_run(&report, today())?;
    println!();
    println!("Run log:  {}", paths.run_log.display());
    println!("JSON log: {}", paths.json_log.display());
    if let Some(svg) = &paths.chart_svg {
        println!("Chart:    {}", svg.display());
    }

    Ok(())
}

fn run_compare(config_path: &Path, source: &SourceArgs, output: &OutputArgs) -> Result<()> {
    let batch = BatchConfig::from_file(config_path)?;
    if batch.runs.is_empty() {
        bail!("{} has no [[run]] entries", config_path.display());
    }

    let runner = Runner::from_boxed(build_provider(source)?);
    let outcome = run_batch_file(&runner, &batch);

    println!();
    print!("{}", format_batch(&outcome));

    let manager = ArtifactManager::new(&output.output_dir)?.with_charts(!output.no_chart);
    let run_date = today();
    for report in &outcome.reports {
        manager.save_run(report, run_date)?;
    }

    let stem = config_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "batch".to_string());
    let table_path = output.output_dir.join(format!("{stem}_comparison.csv"));
    fs::write(&table_path, outcome.comparison_csv()?)
        .with_context(|| format!("failed to write {}", table_path.display()))?;
    println!();
    println!("Comparison: {}", table_path.display());

    if outcome.reports.is_empty() {
        bail!("all {} runs failed", outcome.failures.len());
    }
    Ok(())
}

fn run_summarize(logs: &[PathBuf], out: &Path) -> Result<()> {
    let table = ComparisonTable::from_files(logs)?;
    table.write_csv(out)?;
    println!(
        "Combined {} logs ({} keys) into {}",
        table.columns.len(),
        table.rows.len(),
        out.display()
    );
    Ok(())
}
