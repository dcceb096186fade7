//! CSV export of series, frames and comparison sets.
//!
//! Floats are written with `f64`'s `Display`, which is the shortest string that
//! parses back to the same value, so exported prices survive a round trip exactly.

use crate::models::{ComparisonSet, DateRange, OhlcvRow, SeriesFrame, TickerSeries};

const OHLCV_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Anything that can be written as a CSV table with a header row.
pub trait CsvExport {
    fn header(&self) -> Vec<String>;

    fn write_rows<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), csv::Error>;

    fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.header())?;
        self.write_rows(&mut writer)?;
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Suggested download name for an export over `range`
pub fn export_filename(range: &DateRange) -> String {
    format!("stocks_{}_{}.csv", range.start(), range.end())
}

fn ohlcv_cells(row: &OhlcvRow) -> [String; 5] {
    [
        row.open.to_string(),
        row.high.to_string(),
        row.low.to_string(),
        row.close.to_string(),
        row.volume.to_string(),
    ]
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvExport for TickerSeries {
    fn header(&self) -> Vec<String> {
        OHLCV_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn write_rows<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), csv::Error> {
        for row in self.rows() {
            let mut record = vec![row.date.to_string()];
            record.extend(ohlcv_cells(row));
            writer.write_record(&record)?;
        }
        Ok(())
    }
}

impl CsvExport for SeriesFrame {
    fn header(&self) -> Vec<String> {
        let mut header = self.series.header();
        header.extend(self.averages.iter().map(|ma| ma.column_name()));
        header
    }

    fn write_rows<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), csv::Error> {
        for row in self.series.rows() {
            let mut record = vec![row.date.to_string()];
            record.extend(ohlcv_cells(row));
            record.extend(self.averages.iter().map(|ma| optional_cell(ma.value_on(row.date))));
            writer.write_record(&record)?;
        }
        Ok(())
    }
}

impl CsvExport for ComparisonSet {
    fn header(&self) -> Vec<String> {
        let mut header = vec!["date".to_string()];
        for aligned in &self.series {
            header.extend(
                OHLCV_COLUMNS[1..]
                    .iter()
                    .map(|column| format!("{}_{}", aligned.symbol, column)),
            );
            header.extend(
                aligned
                    .averages
                    .iter()
                    .map(|ma| format!("{}_ma_{}", aligned.symbol, ma.window)),
            );
        }
        header
    }

    fn write_rows<W: std::io::Write>(&self, writer: &mut csv::Writer<W>) -> Result<(), csv::Error> {
        for (idx, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.to_string()];
            for aligned in &self.series {
                match aligned.rows.get(idx).and_then(|row| row.as_ref()) {
                    Some(row) => record.extend(ohlcv_cells(row)),
                    None => record.extend(std::iter::repeat(String::new()).take(5)),
                }
                record.extend(
                    aligned
                        .averages
                        .iter()
                        .map(|ma| optional_cell(ma.values.get(idx).copied().flatten())),
                );
            }
            writer.write_record(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{align, align_frames, simple_moving_average};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> TickerSeries {
        TickerSeries::from_rows(
            symbol,
            points
                .iter()
                .map(|&(day, c)| OhlcvRow::new(d(day), c - 0.5, c + 1.0, c - 1.0, c, 1_000 + day as u64))
                .collect(),
        )
    }

    fn parse(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_reader(bytes);
        let header = reader.headers().unwrap().iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_series_round_trip_preserves_closes() {
        let closes = [185.64, 0.1 + 0.2, 1.0 / 3.0, 123456.789012345];
        let s = TickerSeries::from_rows(
            "AAPL",
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| OhlcvRow::new(d(i as u32 + 1), c, c, c, c, 5))
                .collect(),
        );

        let (header, rows) = parse(&s.to_csv().unwrap());
        assert_eq!(header, vec!["date", "open", "high", "low", "close", "volume"]);

        let parsed: Vec<f64> = rows.iter().map(|r| r[4].parse().unwrap()).collect();
        assert_eq!(parsed, closes.to_vec());
        assert_eq!(rows[0][0], "2024-01-01");
    }

    #[test]
    fn test_frame_columns_and_blank_cells() {
        let s = series("AAPL", &[(1, 10.0), (2, 12.0), (3, 14.0), (4, 16.0)]);
        let short = simple_moving_average(&s, 2).unwrap();
        let long = simple_moving_average(&s, 3).unwrap();
        let frame = SeriesFrame::new(s, vec![short, long]);

        let bytes = frame.to_csv().unwrap();
        let (header, rows) = parse(&bytes);
        assert_eq!(header, vec!["date", "open", "high", "low", "close", "volume", "ma_2", "ma_3"]);
        assert_eq!(rows[0][6], "");
        assert_eq!(rows[0][7], "");
        assert_eq!(rows[1][6], "11");
        assert_eq!(rows[2][7], "12");
        assert_eq!(rows[3][6], "15");

        // stable across calls
        assert_eq!(frame.to_csv().unwrap(), bytes);
    }

    #[test]
    fn test_comparison_absent_cells_are_empty() {
        let aapl = series("AAPL", &[(1, 10.0), (2, 11.0), (3, 12.0)]);
        let msft = series("MSFT", &[(1, 20.0), (3, 22.0)]);
        let range = DateRange::new(d(1), d(3)).unwrap();

        let (header, rows) = parse(&align(&[aapl, msft], range).to_csv().unwrap());
        assert_eq!(
            header,
            vec![
                "date", "AAPL_open", "AAPL_high", "AAPL_low", "AAPL_close", "AAPL_volume",
                "MSFT_open", "MSFT_high", "MSFT_low", "MSFT_close", "MSFT_volume",
            ]
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][4], "11");
        assert!(rows[1][6..11].iter().all(|cell| cell.is_empty()));
        assert_eq!(rows[2][9], "22");
    }

    #[test]
    fn test_comparison_includes_averages() {
        let aapl = series("AAPL", &[(1, 10.0), (2, 12.0)]);
        let ma = simple_moving_average(&aapl, 2).unwrap();
        let range = DateRange::new(d(1), d(2)).unwrap();
        let set = align_frames(&[SeriesFrame::new(aapl, vec![ma])], range);

        let (header, rows) = parse(&set.to_csv().unwrap());
        assert_eq!(header.last().unwrap(), "AAPL_ma_2");
        assert_eq!(rows[0][6], "");
        assert_eq!(rows[1][6], "11");
    }

    #[test]
    fn test_export_filename() {
        let range = DateRange::new(d(1), d(31)).unwrap();
        assert_eq!(export_filename(&range), "stocks_2024-01-01_2024-01-31.csv");
    }
}
