//! Market data sources.
//!
//! [`MarketDataProvider`] is the seam between the series pipeline and wherever the
//! daily OHLCV rows come from. Implementations only fetch; ordering, range
//! filtering and error classification happen in the pipeline.

pub mod cached;
pub mod csv_dir;
pub mod memory;
pub mod yahoo;

pub use cached::CachedProvider;
pub use csv_dir::CsvDirProvider;
pub use memory::InMemoryProvider;
pub use yahoo::YahooProvider;

use crate::models::OhlcvRow;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur inside a provider implementation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("No data returned")]
    NoData,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Daily rows for `symbol` between `start` and `end` inclusive.
    async fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<OhlcvRow>, ProviderError>;
}

/// Provider selection for the shells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Yahoo,
    Csv,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(SourceKind::Yahoo),
            "csv" => Ok(SourceKind::Csv),
            other => Err(format!("unknown data source '{}' (expected yahoo or csv)", other)),
        }
    }
}
