use super::{MarketDataProvider, ProviderError};
use crate::models::{OhlcvRow, RawStockData};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Reads daily history from `<dir>/<SYMBOL>.csv` files.
///
/// Files need a header row with `date,open,high,low,close,volume` (capitalized
/// names as written by common download tools are accepted too).
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Parse CSV content, keeping rows inside `[start, end]`.
    pub fn parse_csv_content(
        content: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, ProviderError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize::<RawStockData>().enumerate() {
            let raw = record?;
            let row = raw.to_row().map_err(|e| {
                ProviderError::InvalidResponse(format!("row {}: {}", line + 1, e))
            })?;
            if start <= row.date && row.date <= end {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl MarketDataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, ProviderError> {
        let path = self.file_for(symbol);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(symbol, path = %path.display(), "No CSV file for symbol");
                return Err(ProviderError::UnknownSymbol(symbol.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let rows = Self::parse_csv_content(&content, start, end)?;
        debug!(symbol, rows = rows.len(), path = %path.display(), "Loaded CSV history");
        Ok(rows)
    }
}
