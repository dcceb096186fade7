use super::{DateRange, OhlcvRow};
use chrono::NaiveDate;
use serde::Serialize;

/// Moving average values laid out on a comparison date axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedAverage {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// One symbol's rows on the shared date axis; `None` marks a date the symbol has no row for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    pub symbol: String,
    pub rows: Vec<Option<OhlcvRow>>,
    pub averages: Vec<AlignedAverage>,
}

impl AlignedSeries {
    pub fn closes(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.rows.iter().map(|row| row.as_ref().map(|r| r.close))
    }

    pub fn present_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_some()).count()
    }
}

/// Several series aligned on the union of their dates inside a range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSet {
    pub range: DateRange,
    pub dates: Vec<NaiveDate>,
    pub series: Vec<AlignedSeries>,
}

impl ComparisonSet {
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.symbol.as_str())
    }

    pub fn get(&self, symbol: &str) -> Option<&AlignedSeries> {
        self.series.iter().find(|s| s.symbol == symbol)
    }

    /// Row for `symbol` on `date`; `None` when either is unknown or the cell is absent.
    pub fn cell(&self, symbol: &str, date: NaiveDate) -> Option<&OhlcvRow> {
        let idx = self.dates.binary_search(&date).ok()?;
        self.get(symbol)?.rows.get(idx)?.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Close rebased to 100 at the first present value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSeries {
    pub symbol: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSet {
    pub dates: Vec<NaiveDate>,
    pub series: Vec<NormalizedSeries>,
}

/// Percentage change from first to last close for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSummary {
    pub symbol: String,
    pub first_close: f64,
    pub last_close: f64,
    pub return_pct: f64,
}
