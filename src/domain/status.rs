//! Trove lifecycle status as reported by the trove manager contract.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TroveStatus {
    NonExistent,
    Active,
    ClosedByOwner,
    ClosedByLiquidation,
    Unredeemable,
}

impl TroveStatus {
    /// Decode the on-chain status enum. Unknown codes are an error.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            0 => Ok(TroveStatus::NonExistent),
            1 => Ok(TroveStatus::Active),
            2 => Ok(TroveStatus::ClosedByOwner),
            3 => Ok(TroveStatus::ClosedByLiquidation),
            4 => Ok(TroveStatus::Unredeemable),
            other => Err(ValidationError::UnknownTroveStatus(other)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TroveStatus::NonExistent => "Non-existent",
            TroveStatus::Active => "Active",
            TroveStatus::ClosedByOwner => "Closed by owner",
            TroveStatus::ClosedByLiquidation => "Closed by liquidation",
            TroveStatus::Unredeemable => "Unredeemable",
        }
    }
}

impl fmt::Display for TroveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
