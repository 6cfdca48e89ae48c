//! Stability pool reward and yield math.

use crate::domain::dnum::DECIMALS;
use crate::domain::{Dnum, PoolSum, SpYieldGainParams};
use num_bigint::BigInt;

/// Ratio between consecutive scales of the pool's product accumulator.
///
/// When P drops below 1/SCALE_FACTOR the pool multiplies it back up and advances
/// `scale`; sums recorded in the next scale are therefore SCALE_FACTOR times larger.
pub const SCALE_FACTOR: u64 = 1_000_000_000;

pub const ONE_YEAR_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Collateral gained by a deposit since its snapshot.
///
/// `s_at_scale` is the pool sum at the snapshot's (epoch, scale) and
/// `s_at_scale_plus_one` the sum at (epoch, scale + 1), zero if the pool never
/// reached that scale. Gains spanning more than one scale are below precision and
/// ignored, matching the contract.
///
/// Runs on the raw accumulators with a single truncating division at the end:
/// `d * ((S_scale - S_snap) + S_next / 1e9) / P / 1e18` with S at 36 decimals and
/// d, P at 18 leaves the gain at 18 decimals.
pub fn coll_gain_from_snapshots(
    deposit: &Dnum,
    p_snapshot: &Dnum,
    s_snapshot: &PoolSum,
    s_at_scale: &PoolSum,
    s_at_scale_plus_one: &PoolSum,
) -> Dnum {
    // A zero P means the deposit was fully consumed by liquidations.
    if deposit.is_zero() || p_snapshot.is_zero() {
        return Dnum::zero();
    }

    let first_portion = s_at_scale.raw() - s_snapshot.raw();
    let second_portion = s_at_scale_plus_one.raw() / BigInt::from(SCALE_FACTOR);
    let sum = first_portion + second_portion;

    let divisor = p_snapshot.raw() * BigInt::from(10u32).pow(DECIMALS);
    Dnum::from_raw(deposit.raw() * sum / divisor)
}

/// Annual stable-asset yield routed to the pool divided by its deposits.
///
/// `None` when the pool holds no deposits.
pub fn calculate_stability_pool_apr(params: &SpYieldGainParams) -> Option<f64> {
    if params.total_bold_deposits.is_zero() {
        return None;
    }
    let annual_sp_yield = &params.agg_weighted_debt_sum * &params.sp_yield_split;
    annual_sp_yield
        .checked_div(&params.total_bold_deposits)
        .map(|apr| apr.to_f64())
}

/// Yield owed to the pool at `now_s` that has not been distributed yet.
pub fn pending_sp_yield(params: &SpYieldGainParams, now_s: i64) -> Dnum {
    let elapsed = (now_s - params.last_agg_update_time).max(0);
    let pending_interest = params
        .agg_weighted_debt_sum
        .mul_int(elapsed)
        .checked_div_int(ONE_YEAR_SECONDS)
        .unwrap_or_default();
    &pending_interest * &params.sp_yield_split + params.yield_gains_pending.clone()
}

/// A depositor's stable-asset gain at `now_s`: what the contract has recorded
/// plus their pro-rata share of the pending pool yield.
pub fn continuous_bold_gain(
    params: &SpYieldGainParams,
    deposit: &Dnum,
    recorded_gain: &Dnum,
    now_s: i64,
) -> Dnum {
    let pending = pending_sp_yield(params, now_s);
    let share_of_pending = (&pending * deposit)
        .checked_div(&params.total_bold_deposits)
        .unwrap_or_default();
    recorded_gain + &share_of_pending
}
