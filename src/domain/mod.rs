//! Domain types for protocol positions.
//!
//! This module provides:
//! - Fixed-point amounts via `Dnum`, pool sums via `PoolSum` and display percentages via `Percent`
//! - Primitives: `Address`, collateral catalog, trove identifiers and status
//! - Raw indexer/contract records and the typed positions derived from them

pub mod collateral;
pub mod dnum;
pub mod error;
pub mod percent;
pub mod pool;
pub mod position;
pub mod primitives;
pub mod status;
pub mod trove;

pub use collateral::{
    collateral_from_trove_symbol, CollIndex, CollateralCatalog, CollateralContracts,
    CollateralSymbol, CollateralToken,
};
pub use dnum::{Dnum, DnumParseError};
pub use error::ValidationError;
pub use percent::Percent;
pub use pool::{
    DepositSnapshot, EpochScale, InterestRateBracket, PoolSum, SpYieldGainParams,
    StabilityPoolDeposit, S_DECIMALS,
};
pub use position::{EarnPool, EarnPosition, EarnRewards, StakePosition, StakeRewards};
pub use primitives::{Address, AddressParseError};
pub use status::TroveStatus;
pub use trove::{compute_trove_id, shorten_trove_id, trove_nft_url, PrefixedTroveId, TroveId};
