pub mod alignment;
pub mod date;
pub mod logger;
pub mod moving_average;
pub mod tickers;

pub use alignment::*;
pub use date::*;
pub use logger::*;
pub use moving_average::*;
pub use tickers::*;
