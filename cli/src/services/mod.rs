pub mod chart;
pub mod export;
pub mod pipeline;

pub use chart::*;
pub use export::*;
pub use pipeline::*;
