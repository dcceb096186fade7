pub mod comparison;
pub mod indicators;
pub mod stock_data;

pub use comparison::*;
pub use indicators::*;
pub use stock_data::*;
