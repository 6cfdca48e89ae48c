//! Async data plumbing between the remote sources and the pure engine.

pub mod positions;
pub mod query_cache;

pub use positions::{PositionService, ServiceError, TroveView};
pub use query_cache::{QueryCache, QueryKey, QueryStatus};
