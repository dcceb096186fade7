//! The series pipeline: fetch, moving averages, alignment and export.
//!
//! The pipeline holds no per-request state. Every call is a function of its
//! arguments plus whatever the provider returns, so the shells can re-run it on
//! any input change and throw the previous output away.

use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    ComparisonSet, DateRange, MaWindows, MovingAverage, OhlcvRow, SeriesFrame, TickerSeries,
};
use crate::providers::MarketDataProvider;
use crate::services::export::CsvExport;
use crate::utils::{align, align_frames, normalize_symbol, simple_moving_average, Logger, Timer};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of fetching several tickers: what loaded and what did not.
#[derive(Debug)]
pub struct FetchReport {
    pub series: Vec<TickerSeries>,
    pub missing: Vec<(String, PipelineError)>,
}

impl FetchReport {
    pub fn missing_symbols(&self) -> Vec<&str> {
        self.missing.iter().map(|(symbol, _)| symbol.as_str()).collect()
    }
}

#[derive(Clone)]
pub struct SeriesPipeline {
    provider: Arc<dyn MarketDataProvider>,
    logger: Logger,
}

impl SeriesPipeline {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            provider,
            logger: Logger::new("PIPELINE"),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Fetch one symbol's daily history inside `range`.
    ///
    /// The returned series has strictly increasing dates, all inside `range`.
    /// An empty result, including a range with no trading days, is `NoDataFound`.
    pub async fn fetch(&self, symbol: &str, range: DateRange) -> PipelineResult<TickerSeries> {
        let symbol = normalize_symbol(symbol)?;
        let timer = Timer::start(&format!("fetch {}", symbol));

        let raw = self
            .provider
            .fetch(&symbol, range.start(), range.end())
            .await
            .map_err(|e| {
                warn!(%symbol, provider = self.provider.name(), error = %e, "Provider fetch failed");
                PipelineError::from_provider(e, &symbol, range)
            })?;

        let received = raw.len();
        let finite = raw.into_iter().filter(OhlcvRow::is_finite).collect();
        let series = TickerSeries::from_rows(symbol.clone(), finite).restricted_to(&range);

        if series.is_empty() {
            info!(%symbol, %range, received, "No rows in requested range");
            return Err(PipelineError::NoDataFound { symbol, range });
        }

        debug!(%symbol, received, kept = series.len(), "Cleaned provider rows");
        timer.log_elapsed();
        Ok(series)
    }

    /// Fetch each symbol in turn; failures are collected instead of aborting.
    ///
    /// Fails only when no symbol could be loaded, returning the first failure.
    pub async fn fetch_many(&self, symbols: &[String], range: DateRange) -> PipelineResult<FetchReport> {
        if symbols.is_empty() {
            return Err(PipelineError::invalid("enter at least one ticker (example: AAPL, MSFT)"));
        }

        let mut series = Vec::with_capacity(symbols.len());
        let mut missing = Vec::new();
        for symbol in symbols {
            match self.fetch(symbol, range).await {
                Ok(s) => series.push(s),
                Err(e) => missing.push((symbol.clone(), e)),
            }
        }

        if series.is_empty() {
            // non-empty: every symbol failed
            let (_, first) = missing.remove(0);
            return Err(first);
        }

        let report = FetchReport { series, missing };
        if !report.missing.is_empty() {
            self.logger
                .warn(&format!("No data for: {}", report.missing_symbols().join(", ")));
        }
        self.logger.info(&format!(
            "Fetched {}/{} tickers ({})",
            report.series.len(),
            symbols.len(),
            range
        ));
        Ok(report)
    }

    pub fn compute_moving_average(series: &TickerSeries, window: usize) -> PipelineResult<MovingAverage> {
        simple_moving_average(series, window)
    }

    /// Short and long averages, in that order.
    pub fn moving_averages(series: &TickerSeries, windows: MaWindows) -> PipelineResult<Vec<MovingAverage>> {
        Ok(vec![
            simple_moving_average(series, windows.short())?,
            simple_moving_average(series, windows.long())?,
        ])
    }

    pub fn frame(series: TickerSeries, windows: MaWindows) -> PipelineResult<SeriesFrame> {
        let averages = Self::moving_averages(&series, windows)?;
        Ok(SeriesFrame::new(series, averages))
    }

    /// Fetch plus both moving averages.
    pub async fn build_frame(
        &self,
        symbol: &str,
        range: DateRange,
        windows: MaWindows,
    ) -> PipelineResult<SeriesFrame> {
        let series = self.fetch(symbol, range).await?;
        Self::frame(series, windows)
    }

    pub fn align_for_comparison(series: &[TickerSeries], range: DateRange) -> ComparisonSet {
        align(series, range)
    }

    pub fn align_frames_for_comparison(frames: &[SeriesFrame], range: DateRange) -> ComparisonSet {
        align_frames(frames, range)
    }

    pub fn export<T: CsvExport>(data: &T) -> Result<Vec<u8>, csv::Error> {
        data.to_csv()
    }
}
