pub mod objects;

pub mod helpers;

pub mod errors;
pub use errors::SourceError;

pub mod http;

pub mod cache;

pub mod providers;
pub use providers::*;

pub mod snapshot;
pub use snapshot::*;

pub mod sentiment;
pub use sentiment::*;

pub mod market_table;
pub use market_table::*;

#[cfg(test)]
pub(crate) mod test_server;
