//! Assemble typed positions from raw records and derived gains.

use super::stability_pool::coll_gain_from_snapshots;
use crate::domain::{
    Address, CollateralCatalog, Dnum, EarnPosition, EarnRewards, PoolSum,
    StabilityPoolDeposit, StakePosition, StakeRewards, ValidationError,
};
use std::str::FromStr;

/// Validate an indexed deposit and attach its rewards.
///
/// # Errors
/// `InvalidCollIndex` or `InvalidAddress` naming the offending value; no partial record
/// is ever produced.
pub fn earn_position_from_graph(
    sp_deposit: &StabilityPoolDeposit,
    rewards: EarnRewards,
    catalog: &CollateralCatalog,
) -> Result<EarnPosition, ValidationError> {
    let coll_index = catalog.coll_index(sp_deposit.coll_index)?;
    let owner = Address::from_str(&sp_deposit.depositor).map_err(|_| {
        ValidationError::InvalidAddress {
            field: "depositor",
            value: sp_deposit.depositor.clone(),
        }
    })?;

    Ok(EarnPosition {
        owner,
        coll_index,
        deposit: sp_deposit.deposit.clone(),
        rewards,
    })
}

/// Earn position with the collateral gain derived from the two sum readings that
/// bracket the deposit's snapshot scale.
pub fn earn_position(
    sp_deposit: &StabilityPoolDeposit,
    s_at_scale: &PoolSum,
    s_at_scale_plus_one: &PoolSum,
    bold_gain: Dnum,
    catalog: &CollateralCatalog,
) -> Result<EarnPosition, ValidationError> {
    let coll_gain = coll_gain_from_snapshots(
        &sp_deposit.deposit,
        &sp_deposit.snapshot.p,
        &sp_deposit.snapshot.s,
        s_at_scale,
        s_at_scale_plus_one,
    );
    earn_position_from_graph(
        sp_deposit,
        EarnRewards {
            bold: bold_gain,
            coll: coll_gain,
        },
        catalog,
    )
}

/// Stake position from the two staking contract reads.
pub fn stake_position_from_reads(owner: Address, deposit: Dnum, total_staked: Dnum) -> StakePosition {
    let share = if total_staked > Dnum::zero() {
        deposit.checked_div(&total_staked).unwrap_or_default()
    } else {
        Dnum::zero()
    };

    StakePosition {
        owner,
        deposit,
        total_staked,
        share,
        rewards: StakeRewards {
            eth: Dnum::zero(),
            lusd: Dnum::zero(),
        },
    }
}
