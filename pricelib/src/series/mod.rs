pub mod objects;
pub use objects::*;

pub mod codec;

pub mod store;
pub use store::*;

pub mod errors;
pub use errors::StoreError;
