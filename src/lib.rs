pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{ChainReader, DataSourceError, Indexer, MockDataSource};
pub use domain::{
    Address, CollIndex, CollateralCatalog, Dnum, EarnPosition, Percent, PrefixedTroveId,
    StakePosition, TroveId, TroveStatus, ValidationError,
};
pub use error::AppError;
pub use orchestration::{PositionService, QueryCache};
