//! klinelab CLI: download, synth and inspect commands.
//!
//! Commands:
//! - `download`: fetch Binance klines into monthly `YYYY_MM.csv` files
//! - `synth`: write deterministic fake minute klines as monthly files
//! - `inspect`: build the engine for a scenario and report what it would run on

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use klinelab_core::data::synthetic::{generate_minute_bars, write_synthetic_months};
use klinelab_core::data::{download_monthly, BinanceProvider, DownloadRequest, StdoutProgress};
use klinelab_core::scenario::{DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_CASH};
use klinelab_core::{build_engine, ScenarioParams};
use klinelab_runner::{parse_timestamp, ScenarioConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "klinelab", about = "klinelab CLI: monthly kline data and backtest scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download Binance klines into one CSV per month.
    Download {
        /// Trading pair, e.g. XRPUSDT.
        #[arg(long)]
        symbol: String,

        /// Kline interval, e.g. 1m, 5m, 1h.
        #[arg(long, default_value = "1m")]
        interval: String,

        /// Years of history ending now. Ignored when --start is given.
        #[arg(long, default_value_t = 5)]
        years: u32,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to now.
        #[arg(long)]
        end: Option<String>,

        /// Output root; files land in <out>/<SYMBOL>_<interval>/.
        #[arg(long, default_value = "downloaded_coin_data")]
        out: PathBuf,

        /// Re-download months whose file already exists.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Write synthetic minute klines as monthly CSV files.
    Synth {
        /// Output folder.
        #[arg(long)]
        out: PathBuf,

        /// Timestamp of the first bar.
        #[arg(long)]
        start: String,

        /// Number of one-minute bars.
        #[arg(long)]
        bars: usize,

        /// Seed label; the same label always produces the same prices.
        #[arg(long, default_value = "synthetic")]
        label: String,
    },
    /// Build the engine for a scenario and print the resolved data window.
    Inspect {
        /// Path to a TOML scenario file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Folder of monthly CSV files.
        #[arg(long)]
        folder: Option<PathBuf>,

        /// Start date (required with --folder).
        #[arg(long)]
        start: Option<String>,

        /// End date, inclusive.
        #[arg(long)]
        end: Option<String>,

        /// Bars to include before the start date.
        #[arg(long, default_value_t = 0)]
        warmup: usize,

        #[arg(long, default_value_t = DEFAULT_INITIAL_CASH)]
        cash: f64,

        #[arg(long, default_value_t = DEFAULT_COMMISSION_RATE)]
        commission: f64,

        /// Print a JSON object instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            symbol,
            interval,
            years,
            start,
            end,
            out,
            force,
        } => run_download(symbol, interval, years, start, end, out, force),
        Commands::Synth {
            out,
            start,
            bars,
            label,
        } => run_synth(out, &start, bars, &label),
        Commands::Inspect {
            config,
            folder,
            start,
            end,
            warmup,
            cash,
            commission,
            json,
        } => {
            let (folder, params) = match (config, folder) {
                (Some(_), Some(_)) => bail!("--config and --folder are mutually exclusive"),
                (None, None) => bail!("one of --config or --folder is required"),
                (Some(path), None) => {
                    let config = ScenarioConfig::from_file(&path)?;
                    let params = config.params()?;
                    (config.folder, params)
                }
                (None, Some(folder)) => {
                    let Some(start) = start else {
                        bail!("--start is required with --folder");
                    };
                    let mut params = ScenarioParams::new(parse_timestamp("start", &start)?)
                        .with_warmup_bars(warmup)
                        .with_initial_cash(cash)
                        .with_commission_rate(commission);
                    if let Some(end) = end {
                        params = params.with_end_date(parse_timestamp("end", &end)?);
                    }
                    (folder, params)
                }
            };
            run_inspect(folder, &params, json)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_download(
    symbol: String,
    interval: String,
    years: u32,
    start: Option<String>,
    end: Option<String>,
    out: PathBuf,
    force: bool,
) -> Result<()> {
    let end_dt = end
        .as_deref()
        .map(|s| parse_timestamp("end", s))
        .transpose()?
        .unwrap_or_else(|| Utc::now().naive_utc());

    let start_dt = match start.as_deref() {
        Some(s) => parse_timestamp("start", s)?,
        None => years_before(end_dt, years)?,
    };
    if start_dt >= end_dt {
        bail!("start {start_dt} is not before end {end_dt}");
    }

    let folder = out.join(format!("{symbol}_{interval}"));
    let provider = BinanceProvider::new()?;
    let request = DownloadRequest {
        symbol: &symbol,
        interval: &interval,
        start: start_dt,
        end: end_dt,
        force,
    };

    println!(
        "Downloading {symbol} {interval} klines {start_dt} .. {end_dt} into {}",
        folder.display()
    );
    let summary = download_monthly(&provider, &folder, &request, &StdoutProgress)?;
    println!(
        "Done: {} written, {} skipped, {} empty, {} failed",
        summary.written,
        summary.skipped,
        summary.empty,
        summary.errors.len()
    );

    if !summary.all_succeeded() {
        for (file, err) in &summary.errors {
            eprintln!("Error for {file}: {err}");
        }
        std::process::exit(1);
    }
    Ok(())
}

/// First day of the month `years` before `end`, at midnight.
fn years_before(end: NaiveDateTime, years: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(end.year(), end.month(), 1)
        .zip(years.checked_mul(12))
        .and_then(|(d, months)| d.checked_sub_months(Months::new(months)))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .with_context(|| format!("cannot go back {years} years from {end}"))
}

fn run_synth(out: PathBuf, start: &str, bars: usize, label: &str) -> Result<()> {
    let start = parse_timestamp("start", start)?;
    let generated = generate_minute_bars(label, start, bars);
    let files = write_synthetic_months(&out, &generated)?;

    for file in &files {
        println!("  wrote {}", file.display());
    }
    println!("{} bars in {} files under {}", bars, files.len(), out.display());
    Ok(())
}

fn run_inspect(folder: PathBuf, params: &ScenarioParams, json: bool) -> Result<()> {
    let engine = build_engine(&folder, params)
        .with_context(|| format!("failed to build scenario from {}", folder.display()))?;
    let Some(feed) = engine.feed() else {
        bail!("engine has no data feed");
    };
    let broker = engine.broker();

    if json {
        let report = serde_json::json!({
            "folder": folder.display().to_string(),
            "feed": feed.name,
            "from_date": feed.from_date,
            "to_date": feed.to_date,
            "first_bar": feed.first(),
            "live_start": feed.live_start(),
            "last_bar": feed.last(),
            "bars": feed.len(),
            "warmup_bars": feed.warmup_len(),
            "live_bars": feed.live_len(),
            "cash": broker.cash(),
            "commission_rate": broker.commission().rate,
            "fingerprint": feed.fingerprint(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let fmt = |ts: Option<NaiveDateTime>| ts.map_or_else(|| "-".to_string(), |t| t.to_string());

    println!("Scenario: {}", folder.display());
    println!("Feed:       {}", feed.name);
    println!(
        "Window:     {} .. {}",
        feed.from_date,
        feed.to_date.map_or_else(|| "end of data".to_string(), |t| t.to_string())
    );
    println!("First bar:  {}", fmt(feed.first()));
    println!("Live start: {}", fmt(feed.live_start()));
    println!("Last bar:   {}", fmt(feed.last()));
    println!(
        "Bars:       {} ({} warm-up, {} live)",
        feed.len(),
        feed.warmup_len(),
        feed.live_len()
    );
    println!("Cash:       {:.2}", broker.cash());
    println!("Commission: {}", broker.commission().rate);
    println!("Dataset:    {}", &feed.fingerprint()[..16]);
    Ok(())
}
