pub mod indicators;
pub mod trading_signal;
pub mod analysis;

pub use trading_signal::*;
pub use analysis::*;
