use crate::models::{
    AlignedAverage, AlignedSeries, ComparisonSet, DateRange, NormalizedSeries, NormalizedSet,
    ReturnSummary, SeriesFrame, TickerSeries,
};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Align frames on the union of their dates inside `range`.
///
/// A date missing from a series becomes `None` in that series; nothing is
/// interpolated. Series keep the order they were given in.
pub fn align_frames(frames: &[SeriesFrame], range: DateRange) -> ComparisonSet {
    let dates: Vec<NaiveDate> = frames
        .iter()
        .flat_map(|frame| frame.series.dates())
        .filter(|date| range.contains(*date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let series = frames
        .iter()
        .map(|frame| {
            let mut rows = frame.series.rows().iter().filter(|row| range.contains(row.date)).peekable();
            let aligned_rows = dates
                .iter()
                .map(|date| rows.next_if(|row| row.date == *date).cloned())
                .collect();

            let averages = frame
                .averages
                .iter()
                .map(|ma| AlignedAverage {
                    window: ma.window,
                    values: dates.iter().map(|date| ma.value_on(*date)).collect(),
                })
                .collect();

            AlignedSeries {
                symbol: frame.symbol().to_string(),
                rows: aligned_rows,
                averages,
            }
        })
        .collect();

    ComparisonSet { range, dates, series }
}

/// Align bare series (no moving averages).
pub fn align(series: &[TickerSeries], range: DateRange) -> ComparisonSet {
    let frames: Vec<SeriesFrame> = series.iter().cloned().map(SeriesFrame::from).collect();
    align_frames(&frames, range)
}

/// Rebase each symbol's close so its first present value is 100.
pub fn normalize(set: &ComparisonSet) -> NormalizedSet {
    let series = set
        .series
        .iter()
        .map(|aligned| {
            let base = aligned.closes().flatten().next().filter(|first| *first != 0.0);
            let values = match base {
                Some(base) => aligned.closes().map(|close| close.map(|c| c / base * 100.0)).collect(),
                None => vec![None; set.dates.len()],
            };
            NormalizedSeries {
                symbol: aligned.symbol.clone(),
                values,
            }
        })
        .collect();

    NormalizedSet {
        dates: set.dates.clone(),
        series,
    }
}

/// First-to-last close return for each series; series that are empty or start at zero are skipped.
pub fn returns(series: &[TickerSeries]) -> Vec<ReturnSummary> {
    series
        .iter()
        .filter_map(|s| {
            let first_close = s.first()?.close;
            let last_close = s.last()?.close;
            if first_close == 0.0 {
                return None;
            }
            Some(ReturnSummary {
                symbol: s.symbol().to_string(),
                first_close,
                last_close,
                return_pct: (last_close / first_close - 1.0) * 100.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OhlcvRow;
    use crate::utils::moving_average::simple_moving_average;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> TickerSeries {
        TickerSeries::from_rows(
            symbol,
            points
                .iter()
                .map(|&(day, c)| OhlcvRow::new(d(day), c, c, c, c, 100))
                .collect(),
        )
    }

    #[test]
    fn test_missing_dates_marked_absent() {
        let aapl = series("AAPL", &[(2, 10.0), (3, 11.0), (4, 12.0)]);
        let msft = series("MSFT", &[(2, 20.0), (4, 22.0)]);
        let range = DateRange::new(d(1), d(31)).unwrap();

        let set = align(&[aapl, msft], range);
        assert_eq!(set.dates, vec![d(2), d(3), d(4)]);
        assert!(set.cell("MSFT", d(3)).is_none());
        assert_eq!(set.cell("MSFT", d(4)).unwrap().close, 22.0);
        assert_eq!(set.cell("AAPL", d(3)).unwrap().close, 11.0);
        assert_eq!(set.get("MSFT").unwrap().present_count(), 2);
        assert_eq!(set.symbols().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_truncates_to_range() {
        let aapl = series("AAPL", &[(1, 10.0), (5, 11.0), (9, 12.0)]);
        let range = DateRange::new(d(2), d(8)).unwrap();

        let set = align(&[aapl], range);
        assert_eq!(set.dates, vec![d(5)]);
        assert_eq!(set.series[0].rows.len(), 1);
    }

    #[test]
    fn test_averages_follow_date_axis() {
        let aapl = series("AAPL", &[(2, 10.0), (3, 12.0), (4, 14.0)]);
        let msft = series("MSFT", &[(1, 1.0), (4, 2.0)]);
        let ma = simple_moving_average(&aapl, 2).unwrap();
        let frames = vec![SeriesFrame::new(aapl, vec![ma]), SeriesFrame::from(msft)];
        let range = DateRange::new(d(1), d(4)).unwrap();

        let set = align_frames(&frames, range);
        assert_eq!(set.dates, vec![d(1), d(2), d(3), d(4)]);
        assert_eq!(set.series[0].averages[0].values, vec![None, None, Some(11.0), Some(13.0)]);
        assert!(set.series[1].averages.is_empty());
    }

    #[test]
    fn test_normalize_starts_at_hundred() {
        let aapl = series("AAPL", &[(2, 50.0), (3, 75.0)]);
        let msft = series("MSFT", &[(3, 200.0)]);
        let range = DateRange::new(d(1), d(31)).unwrap();

        let normalized = normalize(&align(&[aapl, msft], range));
        assert_eq!(normalized.series[0].values, vec![Some(100.0), Some(150.0)]);
        assert_eq!(normalized.series[1].values, vec![None, Some(100.0)]);
    }

    #[test]
    fn test_normalize_zero_base() {
        let zero = series("ZERO", &[(2, 0.0), (3, 5.0)]);
        let range = DateRange::new(d(1), d(31)).unwrap();
        let normalized = normalize(&align(&[zero], range));
        assert_eq!(normalized.series[0].values, vec![None, None]);
    }

    #[test]
    fn test_returns() {
        let aapl = series("AAPL", &[(2, 100.0), (3, 110.0)]);
        let empty = series("NONE", &[]);
        let summary = returns(&[aapl, empty]);
        assert_eq!(summary.len(), 1);
        assert!((summary[0].return_pct - 10.0).abs() < 1e-9);
    }
}
