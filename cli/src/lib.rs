//! # tickerdash - stock price series pipeline
//!
//! Turns a ticker and a date range into chart-ready daily series:
//! - OHLCV history from a pluggable market data provider
//! - short/long simple moving averages
//! - multi-ticker alignment on a shared date axis, with gaps kept as gaps
//! - CSV export with a stable column order
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tickerdash::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = SeriesPipeline::new(Arc::new(YahooProvider::new(true)?));
//!     let range = DateRange::last_days(365, tickerdash::utils::today())?;
//!     let frame = pipeline.build_frame("AAPL", range, MaWindows::new(20, 50)?).await?;
//!     let csv = frame.to_csv()?;
//!     println!("{} rows, {} bytes of CSV", frame.series.len(), csv.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod models;
pub mod providers;
pub mod services;
pub mod utils;

// Analysis entry points grouped by concern
pub mod analysis {
    //! Pure transformations over fetched series

    /// Simple moving averages
    pub mod moving_average {
        pub use crate::utils::moving_average::*;
    }

    /// Multi-series alignment, normalization and returns
    pub mod comparison {
        pub use crate::utils::alignment::*;
    }
}

// Prelude for convenient imports
pub mod prelude {
    //! Import this module to get the most commonly used types:
    //! ```rust
    //! use tickerdash::prelude::*;
    //! ```

    pub use crate::error::{PipelineError, PipelineResult};
    pub use crate::models::{
        ComparisonSet, DateRange, MaWindows, MovingAverage, OhlcvRow, SeriesFrame, TickerSeries,
        TimeRange,
    };
    pub use crate::providers::{
        CachedProvider, CsvDirProvider, InMemoryProvider, MarketDataProvider, SourceKind,
        YahooProvider,
    };
    pub use crate::services::{CsvExport, FetchReport, SeriesPipeline};
}

pub use utils::{init_logger, Logger, Timer};
