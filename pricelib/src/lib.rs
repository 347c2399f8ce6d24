pub mod logging;
pub mod util;

pub mod series;
pub mod models;
pub mod sources;

pub mod tracker;
pub use tracker::*;
