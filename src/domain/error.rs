//! Validation failures raised while turning raw protocol data into domain values.

use thiserror::Error;

/// Malformed or out-of-range input. Never coerced into a default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid prefixed trove ID: {0}")]
    InvalidPrefixedTroveId(String),
    #[error("Invalid trove ID: {0}")]
    InvalidTroveId(String),
    #[error("Invalid owner index: {0}")]
    InvalidOwnerIndex(String),
    #[error("Invalid collateral index: {0}")]
    InvalidCollIndex(i64),
    #[error("Invalid {field} address: {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("Unknown trove status number: {0}")]
    UnknownTroveStatus(i64),
    #[error("Unknown collateral symbol: {0}")]
    UnknownCollateralSymbol(String),
}
