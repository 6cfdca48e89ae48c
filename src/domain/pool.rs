//! Raw protocol records as delivered by the indexer and contract reads.

use super::dnum::{parse_fixed, write_fixed};
use super::{Dnum, DnumParseError};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fractional digits of the pool's collateral-per-unit sum `S`.
pub const S_DECIMALS: u32 = 36;

/// Stability pool sum accumulator `S`, kept at its native 36 decimals.
///
/// S grows by collateral gained per unit of deposit, scaled by P's precision, so
/// increments routinely sit below 10^-18. Narrowing it to a `Dnum` loses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolSum(BigInt);

impl PoolSum {
    pub fn from_raw(raw: impl Into<BigInt>) -> Self {
        PoolSum(raw.into())
    }

    /// Whole units, e.g. `from_int(5)` is 5.0.
    pub fn from_int(value: i64) -> Self {
        PoolSum(BigInt::from(value) * BigInt::from(10u32).pow(S_DECIMALS))
    }

    pub fn zero() -> Self {
        PoolSum(BigInt::zero())
    }

    /// The raw accumulator (value x 10^36).
    pub fn raw(&self) -> &BigInt {
        &self.0
    }
}

impl fmt::Display for PoolSum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fixed(f, &self.0, S_DECIMALS)
    }
}

impl FromStr for PoolSum {
    type Err = DnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, S_DECIMALS)
            .map(PoolSum)
            .ok_or_else(|| DnumParseError(s.to_string()))
    }
}

impl Serialize for PoolSum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PoolSum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PoolSum::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Pool accumulators recorded for a depositor at deposit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositSnapshot {
    pub epoch: u64,
    pub scale: u64,
    #[serde(rename = "P")]
    pub p: Dnum,
    #[serde(rename = "S")]
    pub s: PoolSum,
}

/// Stability pool deposit as indexed. Depositor and index are not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityPoolDeposit {
    pub depositor: String,
    pub coll_index: i64,
    pub deposit: Dnum,
    pub snapshot: DepositSnapshot,
}

/// Sum accumulator of a pool at one (epoch, scale) checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochScale {
    pub epoch: u64,
    pub scale: u64,
    #[serde(rename = "S")]
    pub s: PoolSum,
}

/// All debt at one interest rate. `rate` is a fraction (0.05 = 5%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestRateBracket {
    pub rate: Dnum,
    pub total_debt: Dnum,
}

/// Inputs for the stability pool yield of one collateral branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpYieldGainParams {
    /// Sum of debt x annual rate over all troves, i.e. interest per year.
    pub agg_weighted_debt_sum: Dnum,
    /// Seconds since Unix epoch of the last aggregate interest update.
    pub last_agg_update_time: i64,
    /// Share of interest routed to the stability pool (0.75 = 75%).
    pub sp_yield_split: Dnum,
    pub total_bold_deposits: Dnum,
    /// Yield already minted to the pool but not yet distributed.
    pub yield_gains_pending: Dnum,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_sum_keeps_36_decimals() {
        let s = PoolSum::from_str("0.000000000000000000001700000000000001").unwrap();
        assert_eq!(s.raw(), &BigInt::from(1_700_000_000_000_001u64));
        assert_eq!(s.to_string(), "0.000000000000000000001700000000000001");
        assert_eq!(PoolSum::from_str("2").unwrap(), PoolSum::from_int(2));
        assert!(PoolSum::from_str("0.0000000000000000000000000000000000001").is_err());
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = DepositSnapshot {
            epoch: 0,
            scale: 1,
            p: Dnum::from_int(1),
            s: PoolSum::from_raw(5u32),
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["S"], "0.000000000000000000000000000000000005");
        let back: DepositSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }
}
