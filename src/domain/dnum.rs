//! Fixed-point amounts with 18 decimals backed by an arbitrary-precision mantissa.
//!
//! On-chain balances, accumulators and debts are raw integers scaled by 10^18.
//! `Dnum` keeps that raw integer untouched so amounts never pass through floating point;
//! `to_f64` exists only for display ratios.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional decimal digits carried by every `Dnum`.
pub const DECIMALS: u32 = 18;

fn unit() -> BigInt {
    BigInt::from(10u32).pow(DECIMALS)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal amount: {0}")]
pub struct DnumParseError(pub String);

/// Immutable 18-decimal fixed-point number.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dnum(BigInt);

impl Dnum {
    /// Wrap a raw on-chain amount that already carries 18 decimals.
    pub fn from_raw(raw: impl Into<BigInt>) -> Self {
        Dnum(raw.into())
    }

    /// Wrap a raw amount carrying `decimals` fractional digits, rescaling to 18.
    ///
    /// Digits below 10^-18 are truncated toward zero.
    pub fn from_raw_with_decimals(raw: impl Into<BigInt>, decimals: u32) -> Self {
        let raw = raw.into();
        if decimals >= DECIMALS {
            Dnum(raw / BigInt::from(10u32).pow(decimals - DECIMALS))
        } else {
            Dnum(raw * BigInt::from(10u32).pow(DECIMALS - decimals))
        }
    }

    /// Whole units, e.g. `from_int(5)` is 5.0.
    pub fn from_int(value: i64) -> Self {
        Dnum(BigInt::from(value) * unit())
    }

    pub fn zero() -> Self {
        Dnum(BigInt::zero())
    }

    /// The raw mantissa (value x 10^18).
    pub fn raw(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Multiply by a plain integer.
    pub fn mul_int(&self, n: i64) -> Dnum {
        Dnum(&self.0 * BigInt::from(n))
    }

    /// Divide by another amount, truncating toward zero. `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Dnum) -> Option<Dnum> {
        if rhs.is_zero() {
            return None;
        }
        Some(Dnum(&self.0 * unit() / &rhs.0))
    }

    /// Divide by a plain integer, truncating toward zero. `None` when `n` is zero.
    pub fn checked_div_int(&self, n: i64) -> Option<Dnum> {
        if n == 0 {
            return None;
        }
        Some(Dnum(&self.0 / BigInt::from(n)))
    }

    /// Lossy conversion for display-only ratios.
    pub fn to_f64(&self) -> f64 {
        self.0
            .to_f64()
            .map(|m| m / 1e18)
            .unwrap_or(0.0)
    }

    /// Human display rounded half away from zero to `digits` fractional digits,
    /// trailing zeros trimmed.
    pub fn format_digits(&self, digits: u32) -> String {
        let digits = digits.min(DECIMALS);
        let step = BigInt::from(10u32).pow(DECIMALS - digits);
        let half = &step / BigInt::from(2u32);
        let magnitude = self.0.abs();
        let rounded = if step > BigInt::from(1u32) {
            (&magnitude + &half) / &step * &step
        } else {
            magnitude
        };
        let signed = if self.0.is_negative() { -rounded } else { rounded };
        Dnum(signed).to_string()
    }
}

/// Render `raw / 10^decimals` with trailing fractional zeros trimmed.
pub(crate) fn write_fixed(f: &mut fmt::Formatter<'_>, raw: &BigInt, decimals: u32) -> fmt::Result {
    let unit = BigInt::from(10u32).pow(decimals);
    let magnitude = raw.abs();
    let whole = &magnitude / &unit;
    let frac = &magnitude % &unit;
    let sign = if raw.is_negative() { "-" } else { "" };

    if frac.is_zero() {
        return write!(f, "{}{}", sign, whole);
    }

    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    write!(f, "{}{}.{}", sign, whole, frac.trim_end_matches('0'))
}

/// Parse a plain decimal into its raw integer at `decimals` fractional digits.
/// More fractional digits than `decimals` is an error, never a rounding.
pub(crate) fn parse_fixed(s: &str, decimals: u32) -> Option<BigInt> {
    let trimmed = s.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > decimals as usize {
        return None;
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = format!(
        "{}{:0<width$}",
        if whole.is_empty() { "0" } else { whole },
        frac,
        width = decimals as usize
    );
    let raw = BigInt::from_str(&digits).ok()?;
    Some(if negative { -raw } else { raw })
}

impl fmt::Display for Dnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fixed(f, &self.0, DECIMALS)
    }
}

impl FromStr for Dnum {
    type Err = DnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, DECIMALS)
            .map(Dnum)
            .ok_or_else(|| DnumParseError(s.to_string()))
    }
}

impl Serialize for Dnum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dnum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Dnum::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl std::ops::Add for Dnum {
    type Output = Dnum;

    fn add(self, rhs: Dnum) -> Dnum {
        Dnum(self.0 + rhs.0)
    }
}

impl<'a> std::ops::Add<&'a Dnum> for &'a Dnum {
    type Output = Dnum;

    fn add(self, rhs: &'a Dnum) -> Dnum {
        Dnum(&self.0 + &rhs.0)
    }
}

impl std::ops::Sub for Dnum {
    type Output = Dnum;

    fn sub(self, rhs: Dnum) -> Dnum {
        Dnum(self.0 - rhs.0)
    }
}

impl<'a> std::ops::Sub<&'a Dnum> for &'a Dnum {
    type Output = Dnum;

    fn sub(self, rhs: &'a Dnum) -> Dnum {
        Dnum(&self.0 - &rhs.0)
    }
}

impl std::ops::Mul for Dnum {
    type Output = Dnum;

    fn mul(self, rhs: Dnum) -> Dnum {
        Dnum(self.0 * rhs.0 / unit())
    }
}

impl<'a> std::ops::Mul<&'a Dnum> for &'a Dnum {
    type Output = Dnum;

    fn mul(self, rhs: &'a Dnum) -> Dnum {
        Dnum(&self.0 * &rhs.0 / unit())
    }
}

impl std::ops::Neg for Dnum {
    type Output = Dnum;

    fn neg(self) -> Dnum {
        Dnum(-self.0)
    }
}

impl std::iter::Sum for Dnum {
    fn sum<I: Iterator<Item = Dnum>>(iter: I) -> Dnum {
        iter.fold(Dnum::zero(), |acc, d| acc + d)
    }
}
