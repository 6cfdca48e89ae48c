//! Percentage values for interest rates and the rate grid, backed by rust_decimal.
//!
//! Amounts use `Dnum`; percentages are small, bounded numbers, so a 96-bit decimal
//! keeps them exact without the arbitrary-precision machinery.

use super::Dnum;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A percentage such as `5.5` (meaning 5.5%).
///
/// Serializes to a JSON number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Percent(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Percent {
    pub fn new(value: RustDecimal) -> Self {
        Percent(value)
    }

    /// Parse a percentage from a string losslessly.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Percent)
    }

    /// Convert an 18-decimal fraction (0.05) into a percentage (5).
    ///
    /// `None` if the value does not fit a 96-bit decimal.
    pub fn from_fraction(fraction: &Dnum) -> Option<Self> {
        RustDecimal::from_str(&fraction.mul_int(100).to_string())
            .ok()
            .map(Percent)
    }

    /// Canonical string without trailing zeros or exponent notation.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Percent(RustDecimal::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Percent {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Percent {
    fn from(value: RustDecimal) -> Self {
        Percent(value)
    }
}

impl std::ops::Add for Percent {
    type Output = Percent;

    fn add(self, rhs: Percent) -> Percent {
        Percent(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Percent {
    type Output = Percent;

    fn sub(self, rhs: Percent) -> Percent {
        Percent(self.0 - rhs.0)
    }
}
