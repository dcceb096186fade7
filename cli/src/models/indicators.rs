use super::TickerSeries;
use crate::error::{PipelineError, PipelineResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Simple moving average of closing prices.
///
/// Only dates with a full trailing window are present; earlier dates are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    pub points: Vec<MaPoint>,
}

impl MovingAverage {
    pub fn label(&self) -> String {
        format!("SMA {}", self.window)
    }

    pub fn column_name(&self) -> String {
        format!("ma_{}", self.window)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&MaPoint> {
        self.points.last()
    }

    /// Value on `date`, if the window was full by then.
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].value)
    }
}

/// Validated short/long moving average window pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaWindows {
    short: usize,
    long: usize,
}

impl MaWindows {
    pub const DEFAULT_SHORT: usize = 20;
    pub const DEFAULT_LONG: usize = 50;

    /// Rejects zero windows and `short >= long`; the pair is never swapped.
    pub fn new(short: usize, long: usize) -> PipelineResult<Self> {
        if short == 0 || long == 0 {
            return Err(PipelineError::invalid(format!(
                "moving average windows must be positive (short={}, long={})",
                short, long
            )));
        }
        if short >= long {
            return Err(PipelineError::invalid(format!(
                "short window ({}) must be less than long window ({})",
                short, long
            )));
        }
        Ok(Self { short, long })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl Default for MaWindows {
    fn default() -> Self {
        Self {
            short: Self::DEFAULT_SHORT,
            long: Self::DEFAULT_LONG,
        }
    }
}

/// A series together with its moving averages, ready for charting or export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesFrame {
    pub series: TickerSeries,
    pub averages: Vec<MovingAverage>,
}

impl SeriesFrame {
    pub fn new(series: TickerSeries, averages: Vec<MovingAverage>) -> Self {
        Self { series, averages }
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }
}

impl From<TickerSeries> for SeriesFrame {
    fn from(series: TickerSeries) -> Self {
        Self::new(series, Vec::new())
    }
}
