//! Data source abstractions for indexed protocol records and on-chain reads.

use crate::domain::{
    Address, CollIndex, Dnum, EpochScale, InterestRateBracket, SpYieldGainParams,
    StabilityPoolDeposit, TroveId,
};
use async_trait::async_trait;
use std::fmt;

mod http;
pub mod mock;
pub mod rpc;
pub mod subgraph;

pub use mock::MockDataSource;
pub use rpc::RpcChainReader;
pub use subgraph::SubgraphIndexer;

/// Queries against the protocol's GraphQL indexer.
#[async_trait]
pub trait Indexer: Send + Sync + fmt::Debug {
    /// Current deposit of `owner` in the stability pool of `coll_index`, if any.
    async fn stability_pool_deposit(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Option<StabilityPoolDeposit>, DataSourceError>;

    /// Sum accumulator at (epoch, scale), or `None` if the pool never reached it.
    async fn stability_pool_epoch_scale(
        &self,
        coll_index: CollIndex,
        epoch: u64,
        scale: u64,
    ) -> Result<Option<EpochScale>, DataSourceError>;

    /// Aggregated debt per interest rate, in no particular order.
    async fn interest_rate_brackets(
        &self,
        coll_index: CollIndex,
    ) -> Result<Vec<InterestRateBracket>, DataSourceError>;

    async fn stability_pool_total_deposited(
        &self,
        coll_index: CollIndex,
    ) -> Result<Dnum, DataSourceError>;
}

/// Read-only contract calls.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// Governance tokens staked by `owner`.
    async fn stake(&self, owner: &Address) -> Result<Dnum, DataSourceError>;

    async fn total_staked(&self) -> Result<Dnum, DataSourceError>;

    async fn sp_yield_gain_params(
        &self,
        coll_index: CollIndex,
    ) -> Result<SpYieldGainParams, DataSourceError>;

    /// Stable-asset yield already credited to `owner` by the stability pool.
    async fn depositor_yield_gain(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Dnum, DataSourceError>;

    /// Raw status enum of a trove; decode with `TroveStatus::from_code`.
    async fn trove_status_code(
        &self,
        coll_index: CollIndex,
        trove_id: &TroveId,
    ) -> Result<i64, DataSourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Error reported by the remote service itself (GraphQL or JSON-RPC error object)
    Remote(String),
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Remote(msg) => write!(f, "Remote error: {}", msg),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}
