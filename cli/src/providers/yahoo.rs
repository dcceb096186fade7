//! Yahoo Finance chart API client for daily OHLCV history.

use super::{MarketDataProvider, ProviderError};
use crate::models::OhlcvRow;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use chrono_tz::Tz;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
    gmtoffset: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Converts exchange timestamps to the exchange's calendar date
enum ExchangeClock {
    Named(Tz),
    Offset(FixedOffset),
}

impl ExchangeClock {
    fn from_meta(meta: &ChartMeta) -> Self {
        if let Some(tz) = meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            return ExchangeClock::Named(tz);
        }
        let offset = meta
            .gmtoffset
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        ExchangeClock::Offset(offset)
    }

    fn local_date(&self, timestamp: i64) -> Option<NaiveDate> {
        let utc = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
        Some(match self {
            ExchangeClock::Named(tz) => utc.with_timezone(tz).date_naive(),
            ExchangeClock::Offset(offset) => utc.with_timezone(offset).date_naive(),
        })
    }
}

pub struct YahooProvider {
    client: Client,
    base_url: String,
    user_agents: Vec<String>,
    random_agent: bool,
}

impl YahooProvider {
    pub fn new(random_agent: bool) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL, random_agent)
    }

    pub fn with_base_url(base_url: &str, random_agent: bool) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()?;

        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15".to_string(),
        ];

        Ok(YahooProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agents,
            random_agent,
        })
    }

    fn get_user_agent(&self) -> &str {
        if self.random_agent {
            use rand::seq::IndexedRandom;
            if let Some(agent) = self.user_agents.choose(&mut rand::rng()) {
                return agent;
            }
        }
        &self.user_agents[0]
    }

    fn chart_url(&self, symbol: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidResponse(format!("base url {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(&["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    /// UNIX seconds for `[start, end]`; `period2` is exclusive so it points at the day after `end`.
    pub fn period_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
        let midnight = |day: NaiveDate| day.and_time(NaiveTime::MIN).and_utc().timestamp();
        // step in seconds; `end + 1 day` does not exist for the last calendar date
        (midnight(start), midnight(end) + SECONDS_PER_DAY)
    }
}

/// Parse a chart API body into rows; bars with any missing field are skipped.
fn parse_chart_body(symbol: &str, body: &str) -> Result<Vec<OhlcvRow>, ProviderError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("cannot decode chart response: {}", e)))?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(ProviderError::UnknownSymbol(symbol.to_string()));
        }
        return Err(ProviderError::InvalidResponse(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or(ProviderError::NoData)?;

    // Ranges without trading days come back without a timestamp array
    let Some(timestamps) = result.timestamp else {
        return Err(ProviderError::NoData);
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let clock = ExchangeClock::from_meta(&result.meta);

    let mut rows = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;
    for (i, &ts) in timestamps.iter().enumerate() {
        let field = |values: &Vec<Option<f64>>| values.get(i).copied().flatten();
        match (
            clock.local_date(ts),
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            field(&quote.volume),
        ) {
            (Some(date), Some(open), Some(high), Some(low), Some(close), Some(volume)) if volume >= 0.0 => {
                rows.push(OhlcvRow::new(date, open, high, low, close, volume.round() as u64));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(symbol, skipped, "Skipped incomplete bars");
    }
    Ok(rows)
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo"
    }

    #[instrument(skip(self), fields(provider = "yahoo"))]
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, ProviderError> {
        let url = self.chart_url(symbol)?;
        let (period1, period2) = Self::period_bounds(start, end);

        debug!(%url, period1, period2, "Requesting chart data");
        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .header("Accept", "application/json, text/plain, */*")
            .header("User-Agent", self.get_user_agent())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            warn!(symbol, "Symbol not found upstream");
            return Err(ProviderError::UnknownSymbol(symbol.to_string()));
        }
        if !status.is_success() {
            // Yahoo reports some bad requests with a chart error body
            if let Err(err @ ProviderError::UnknownSymbol(_)) = parse_chart_body(symbol, &body) {
                return Err(err);
            }
            return Err(ProviderError::InvalidResponse(format!("HTTP status {}", status)));
        }

        let rows = parse_chart_body(symbol, &body)?;
        info!(symbol, rows = rows.len(), "Fetched daily history");
        Ok(rows)
    }
}
