use crate::error::{PipelineError, PipelineResult};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl OhlcvRow {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// All prices are finite numbers
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Daily price history for one symbol, ordered by strictly increasing date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSeries {
    symbol: String,
    rows: Vec<OhlcvRow>,
}

impl TickerSeries {
    /// Build a series from unordered rows.
    ///
    /// Rows are sorted by date; when a date appears more than once the last row wins.
    pub fn from_rows(symbol: impl Into<String>, mut rows: Vec<OhlcvRow>) -> Self {
        // stable sort keeps provider order among equal dates
        rows.sort_by_key(|row| row.date);

        let mut deduped: Vec<OhlcvRow> = Vec::with_capacity(rows.len());
        for row in rows {
            match deduped.last_mut() {
                Some(last) if last.date == row.date => *last = row,
                _ => deduped.push(row),
            }
        }

        Self {
            symbol: symbol.into(),
            rows: deduped,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn rows(&self) -> &[OhlcvRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.iter().map(|row| row.date)
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.close)
    }

    pub fn first(&self) -> Option<&OhlcvRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&OhlcvRow> {
        self.rows.last()
    }

    /// Keep only the rows whose date falls inside `range`.
    pub fn restricted_to(&self, range: &DateRange) -> Self {
        Self {
            symbol: self.symbol.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| range.contains(row.date))
                .cloned()
                .collect(),
        }
    }
}

/// Lookback presets offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "2W")]
    TwoWeeks,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "2M")]
    TwoMonths,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "2Y")]
    TwoYears,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl TimeRange {
    /// Calendar days covered by the preset
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::OneWeek => 7,
            TimeRange::TwoWeeks => 14,
            TimeRange::OneMonth => 30,
            TimeRange::TwoMonths => 61,
            TimeRange::ThreeMonths => 91,
            TimeRange::SixMonths => 182,
            TimeRange::OneYear => 365,
            TimeRange::TwoYears => 730,
            TimeRange::FiveYears => 1826,
        }
    }
}

impl FromStr for TimeRange {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1W" => Ok(TimeRange::OneWeek),
            "2W" => Ok(TimeRange::TwoWeeks),
            "1M" => Ok(TimeRange::OneMonth),
            "2M" => Ok(TimeRange::TwoMonths),
            "3M" => Ok(TimeRange::ThreeMonths),
            "6M" => Ok(TimeRange::SixMonths),
            "1Y" => Ok(TimeRange::OneYear),
            "2Y" => Ok(TimeRange::TwoYears),
            "5Y" => Ok(TimeRange::FiveYears),
            other => Err(PipelineError::invalid(format!("unknown time range '{}'", other))),
        }
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PipelineResult<Self> {
        if start > end {
            return Err(PipelineError::invalid(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending at `today`.
    pub fn last_days(days: i64, today: NaiveDate) -> PipelineResult<Self> {
        if days <= 0 {
            return Err(PipelineError::invalid(format!("lookback must be positive, got {}", days)));
        }
        Self::new(lookback_start(today, days)?, today)
    }

    pub fn from_preset(range: TimeRange, today: NaiveDate) -> PipelineResult<Self> {
        Self::new(lookback_start(today, range.days())?, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// `days` before `end`, or an error when that falls outside chrono's calendar
fn lookback_start(end: NaiveDate, days: i64) -> PipelineResult<NaiveDate> {
    Duration::try_days(days)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| {
            PipelineError::invalid(format!("{} days before {} is out of range", days, end))
        })
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Row layout of a per-symbol CSV file
#[derive(Debug, Deserialize)]
pub struct RawStockData {
    #[serde(alias = "Date", alias = "time")]
    pub date: String,
    #[serde(alias = "Open")]
    pub open: f64,
    #[serde(alias = "High")]
    pub high: f64,
    #[serde(alias = "Low")]
    pub low: f64,
    #[serde(alias = "Close")]
    pub close: f64,
    #[serde(alias = "Volume")]
    pub volume: f64,
}

impl RawStockData {
    /// Convert to an `OhlcvRow`, accepting `YYYY-MM-DD` optionally followed by a time part.
    pub fn to_row(&self) -> anyhow::Result<OhlcvRow> {
        let day = self.date.trim().get(..10).unwrap_or(self.date.trim());
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")?;
        if !self.volume.is_finite() || self.volume < 0.0 {
            anyhow::bail!("invalid volume {} on {}", self.volume, date);
        }

        Ok(OhlcvRow::new(
            date,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume.round() as u64,
        ))
    }
}
