//! Typed positions served to consumers.

use super::{Address, CollIndex, CollateralToken, Dnum};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnRewards {
    /// Stable-asset yield.
    pub bold: Dnum,
    /// Collateral gained from liquidations.
    pub coll: Dnum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "earn", rename_all = "camelCase")]
pub struct EarnPosition {
    pub owner: Address,
    pub coll_index: CollIndex,
    pub deposit: Dnum,
    pub rewards: EarnRewards,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeRewards {
    pub eth: Dnum,
    pub lusd: Dnum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "stake", rename_all = "camelCase")]
pub struct StakePosition {
    pub owner: Address,
    pub deposit: Dnum,
    pub total_staked: Dnum,
    /// deposit / total_staked, zero when nothing is staked.
    pub share: Dnum,
    pub rewards: StakeRewards,
}

/// Pool-level view of one stability pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnPool {
    pub collateral: CollateralToken,
    /// Annual percentage rate as a fraction; absent while the pool is empty.
    pub apr: Option<f64>,
    pub total_deposited: Dnum,
}
