use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tickerdash::{
    analysis::comparison::{normalize, returns},
    prelude::*,
    utils::{init_logger, parse_tickers, resolve_range, today, MAX_TICKERS},
};

#[derive(Parser)]
#[command(name = "tickerdash")]
#[command(about = "Fetch daily stock history, compute moving averages, compare tickers and export CSV")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct RangeArgs {
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,
    /// End date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    end: Option<String>,
    /// Lookback preset used when no start date is given (1W, 1M, 3M, 6M, 1Y, 2Y, 5Y)
    #[arg(long)]
    range: Option<String>,
    /// Data source: yahoo or csv
    #[arg(long, default_value = "yahoo")]
    source: String,
    /// Directory of <SYMBOL>.csv files for the csv source
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

#[derive(Args, Clone, Copy)]
pub struct WindowArgs {
    /// Short moving average window
    #[arg(long, default_value_t = MaWindows::DEFAULT_SHORT)]
    short: usize,
    /// Long moving average window
    #[arg(long, default_value_t = MaWindows::DEFAULT_LONG)]
    long: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize one ticker with its moving averages
    Show {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        windows: WindowArgs,
    },
    /// Compare returns of several tickers
    Compare {
        /// Ticker symbols (comma or space separated)
        #[arg(short, long)]
        tickers: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Write CSV for one ticker (with moving averages) or a comparison of several
    Export {
        /// Ticker symbols (comma or space separated)
        #[arg(short, long)]
        tickers: String,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        windows: WindowArgs,
    },
}

fn build_pipeline(args: &RangeArgs) -> anyhow::Result<SeriesPipeline> {
    let kind: SourceKind = args.source.parse().map_err(anyhow::Error::msg)?;
    let provider: Arc<dyn MarketDataProvider> = match kind {
        SourceKind::Yahoo => Arc::new(YahooProvider::new(true)?),
        SourceKind::Csv => Arc::new(CsvDirProvider::new(&args.data_dir)),
    };
    Ok(SeriesPipeline::new(provider))
}

fn resolve(args: &RangeArgs) -> anyhow::Result<DateRange> {
    let preset = args.range.as_deref().map(str::parse::<TimeRange>).transpose()?;
    Ok(resolve_range(
        args.start.as_deref(),
        args.end.as_deref(),
        preset,
        TimeRange::OneYear.days(),
        today(),
    )?)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Show { ticker, range, windows } => {
            let pipeline = build_pipeline(&range)?;
            let date_range = resolve(&range)?;
            let windows = MaWindows::new(windows.short, windows.long)?;
            let frame = pipeline.build_frame(&ticker, date_range, windows).await?;

            let series = &frame.series;
            println!("{} ({}) {}", series.symbol(), pipeline.provider_name(), date_range);
            println!("  trading days: {}", series.len());
            if let (Some(first), Some(last)) = (series.first(), series.last()) {
                println!("  first close:  {:.2} on {}", first.close, first.date);
                println!("  last close:   {:.2} on {}", last.close, last.date);
            }
            for ma in &frame.averages {
                println!("  {:<12}  {}", ma.label(), fmt_opt(ma.latest().map(|p| p.value)));
            }
        }
        Commands::Compare { tickers, range } => {
            let pipeline = build_pipeline(&range)?;
            let date_range = resolve(&range)?;
            let symbols = parse_tickers(&tickers, MAX_TICKERS);
            let report = pipeline.fetch_many(&symbols, date_range).await?;

            let set = SeriesPipeline::align_for_comparison(&report.series, date_range);
            let normalized = normalize(&set);
            println!("Comparison {} ({} trading days)", date_range, set.dates.len());
            for summary in returns(&report.series) {
                let last_norm = normalized
                    .series
                    .iter()
                    .find(|s| s.symbol == summary.symbol)
                    .and_then(|s| s.values.iter().rev().flatten().next().copied());
                println!(
                    "  {:<8} {:>10.2} -> {:>10.2}  return {:>7.2}%  (rebased {})",
                    summary.symbol,
                    summary.first_close,
                    summary.last_close,
                    summary.return_pct,
                    fmt_opt(last_norm)
                );
            }
            if !report.missing.is_empty() {
                println!("  No data for: {}", report.missing_symbols().join(", "));
            }
        }
        Commands::Export { tickers, output, range, windows } => {
            let pipeline = build_pipeline(&range)?;
            let date_range = resolve(&range)?;
            let windows = MaWindows::new(windows.short, windows.long)?;
            let symbols = parse_tickers(&tickers, MAX_TICKERS);

            let bytes = if symbols.len() == 1 {
                let frame = pipeline.build_frame(&symbols[0], date_range, windows).await?;
                SeriesPipeline::export(&frame)?
            } else {
                let report = pipeline.fetch_many(&symbols, date_range).await?;
                let frames = report
                    .series
                    .into_iter()
                    .map(|series| SeriesPipeline::frame(series, windows))
                    .collect::<Result<Vec<_>, _>>()?;
                let set = SeriesPipeline::align_frames_for_comparison(&frames, date_range);
                SeriesPipeline::export(&set)?
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&bytes)?;
                }
            }
        }
    }

    Ok(())
}
