//! Chart-ready specifications.
//!
//! These are plain serializable structures; the front end decides how to draw them.

use crate::models::{MovingAverage, NormalizedSet, SeriesFrame};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeBar {
    pub date: NaiveDate,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTrace {
    pub name: String,
    pub points: Vec<LinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandlestickChart {
    pub title: String,
    pub symbol: String,
    pub candles: Vec<Candle>,
    /// Second panel, present when volume display is on
    pub volume: Option<Vec<VolumeBar>>,
    pub overlays: Vec<LineTrace>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub traces: Vec<LineTrace>,
}

fn average_trace(ma: &MovingAverage) -> LineTrace {
    LineTrace {
        name: ma.label(),
        points: ma
            .points
            .iter()
            .map(|p| LinePoint {
                date: p.date,
                value: Some(p.value),
            })
            .collect(),
    }
}

/// Candles plus one overlay per moving average, with optional volume bars.
pub fn candlestick_chart(frame: &SeriesFrame, show_volume: bool) -> CandlestickChart {
    let rows = frame.series.rows();
    CandlestickChart {
        title: format!("{} Candlestick + SMAs", frame.symbol()),
        symbol: frame.symbol().to_string(),
        candles: rows
            .iter()
            .map(|row| Candle {
                date: row.date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
            })
            .collect(),
        volume: show_volume.then(|| {
            rows.iter()
                .map(|row| VolumeBar {
                    date: row.date,
                    volume: row.volume,
                })
                .collect()
        }),
        overlays: frame.averages.iter().map(average_trace).collect(),
    }
}

/// Close line with moving average lines.
pub fn price_line_chart(frame: &SeriesFrame) -> LineChart {
    let close = LineTrace {
        name: "Close".to_string(),
        points: frame
            .series
            .rows()
            .iter()
            .map(|row| LinePoint {
                date: row.date,
                value: Some(row.close),
            })
            .collect(),
    };

    let mut traces = vec![close];
    traces.extend(frame.averages.iter().map(average_trace));

    LineChart {
        title: format!("{} Close & Moving Averages", frame.symbol()),
        x_label: "Date".to_string(),
        y_label: "Price".to_string(),
        traces,
    }
}

/// One line per symbol; absent dates stay as `null` points so gaps are visible.
pub fn comparison_chart(normalized: &NormalizedSet) -> LineChart {
    let traces = normalized
        .series
        .iter()
        .map(|series| LineTrace {
            name: series.symbol.clone(),
            points: normalized
                .dates
                .iter()
                .zip(&series.values)
                .map(|(date, value)| LinePoint {
                    date: *date,
                    value: *value,
                })
                .collect(),
        })
        .collect();

    LineChart {
        title: "Normalized comparison (100 = first day)".to_string(),
        x_label: "Date".to_string(),
        y_label: "Close (rebased)".to_string(),
        traces,
    }
}
