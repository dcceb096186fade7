use crate::error::{PipelineError, PipelineResult};
use crate::models::{MaPoint, MovingAverage, TickerSeries};

/// Simple moving average of `close` over a trailing window of `window` rows.
///
/// Produces `max(0, len - window + 1)` points, starting at the first date with a
/// full window. Each value is the plain mean of its window, so no error
/// accumulates along the series.
pub fn simple_moving_average(series: &TickerSeries, window: usize) -> PipelineResult<MovingAverage> {
    if window == 0 {
        return Err(PipelineError::invalid("moving average window must be positive"));
    }

    let rows = series.rows();
    let divisor = window as f64;
    let points = rows
        .windows(window)
        .map(|slice| MaPoint {
            date: slice[window - 1].date,
            value: slice.iter().map(|row| row.close).sum::<f64>() / divisor,
        })
        .collect();

    Ok(MovingAverage { window, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OhlcvRow;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> TickerSeries {
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64);
                OhlcvRow::new(date, c, c, c, c, 1000)
            })
            .collect();
        TickerSeries::from_rows("TEST", rows)
    }

    #[test]
    fn test_window_two_example() {
        let ma = simple_moving_average(&series(&[10.0, 12.0, 14.0, 16.0]), 2).unwrap();
        let d = |n| NaiveDate::from_ymd_opt(2024, 1, n).unwrap();
        assert_eq!(
            ma.points,
            vec![
                MaPoint { date: d(2), value: 11.0 },
                MaPoint { date: d(3), value: 13.0 },
                MaPoint { date: d(4), value: 15.0 },
            ]
        );
    }

    #[test]
    fn test_output_length() {
        let s = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        for window in 1..=7 {
            let ma = simple_moving_average(&s, window).unwrap();
            assert_eq!(ma.len(), 5usize.saturating_sub(window - 1), "window {}", window);
        }
    }

    #[test]
    fn test_window_one_is_close() {
        let s = series(&[3.5, 4.25]);
        let ma = simple_moving_average(&s, 1).unwrap();
        let values: Vec<f64> = ma.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![3.5, 4.25]);
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = simple_moving_average(&series(&[1.0]), 0).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_series() {
        let ma = simple_moving_average(&series(&[]), 3).unwrap();
        assert!(ma.is_empty());
    }
}
