//! Supported collateral assets and the index-to-token catalog.

use super::{Address, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index of a collateral branch, valid for the catalog it was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollIndex(usize);

impl CollIndex {
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CollIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollateralSymbol {
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "RETH")]
    Reth,
    #[serde(rename = "STETH")]
    Steth,
}

impl CollateralSymbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollateralSymbol::Eth => "ETH",
            CollateralSymbol::Reth => "RETH",
            CollateralSymbol::Steth => "STETH",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CollateralSymbol::Eth => "ETH",
            CollateralSymbol::Reth => "rETH",
            CollateralSymbol::Steth => "stETH",
        }
    }
}

impl fmt::Display for CollateralSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CollateralSymbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ETH" => Ok(CollateralSymbol::Eth),
            "RETH" => Ok(CollateralSymbol::Reth),
            "STETH" => Ok(CollateralSymbol::Steth),
            other => Err(ValidationError::UnknownCollateralSymbol(other.to_string())),
        }
    }
}

/// Map a token symbol reported by a trove contract to a known collateral.
///
/// Test deployments use numbered symbols such as `stETH1`, hence the prefix match.
pub fn collateral_from_trove_symbol(symbol: &str) -> Option<CollateralSymbol> {
    let symbol = symbol.to_uppercase();
    if symbol == "ETH" || symbol == "WETH" {
        return Some(CollateralSymbol::Eth);
    }
    if symbol.starts_with("RETH") {
        return Some(CollateralSymbol::Reth);
    }
    if symbol.starts_with("STETH") {
        return Some(CollateralSymbol::Steth);
    }
    None
}

/// Per-branch contract addresses. Any of them may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollateralContracts {
    pub trove_nft: Option<Address>,
    pub trove_manager: Option<Address>,
    pub active_pool: Option<Address>,
    pub stability_pool: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralToken {
    pub coll_index: CollIndex,
    pub symbol: CollateralSymbol,
    pub name: &'static str,
    pub decimals: u32,
    #[serde(skip)]
    pub contracts: CollateralContracts,
}

/// Ordered list of collateral branches; position in the list is the collateral index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralCatalog {
    tokens: Vec<CollateralToken>,
}

impl CollateralCatalog {
    pub fn new(branches: Vec<(CollateralSymbol, CollateralContracts)>) -> Self {
        let tokens = branches
            .into_iter()
            .enumerate()
            .map(|(i, (symbol, contracts))| CollateralToken {
                coll_index: CollIndex(i),
                symbol,
                name: symbol.name(),
                decimals: 18,
                contracts,
            })
            .collect();
        Self { tokens }
    }

    pub fn from_symbols(symbols: &[CollateralSymbol]) -> Self {
        Self::new(
            symbols
                .iter()
                .map(|s| (*s, CollateralContracts::default()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Validate a raw collateral index against this catalog.
    pub fn coll_index(&self, value: i64) -> Result<CollIndex, ValidationError> {
        usize::try_from(value)
            .ok()
            .filter(|i| *i < self.tokens.len())
            .map(CollIndex)
            .ok_or(ValidationError::InvalidCollIndex(value))
    }

    pub fn get(&self, coll_index: CollIndex) -> Result<&CollateralToken, ValidationError> {
        self.tokens
            .get(coll_index.0)
            .ok_or(ValidationError::InvalidCollIndex(coll_index.0 as i64))
    }

    pub fn index_of(&self, symbol: CollateralSymbol) -> Option<CollIndex> {
        self.tokens
            .iter()
            .find(|t| t.symbol == symbol)
            .map(|t| t.coll_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollateralToken> {
        self.tokens.iter()
    }
}

impl Default for CollateralCatalog {
    fn default() -> Self {
        Self::from_symbols(&[
            CollateralSymbol::Eth,
            CollateralSymbol::Reth,
            CollateralSymbol::Steth,
        ])
    }
}
