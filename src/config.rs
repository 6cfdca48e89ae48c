use crate::domain::{Address, CollateralCatalog, CollateralContracts, CollateralSymbol, Dnum, Percent};
use crate::engine::{RateGrid, MAX_GRID_STEPS};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub subgraph_url: String,
    pub rpc_url: String,
    pub staking_address: Address,
    pub collaterals: CollateralCatalog,
    pub chain_block_explorer_url: Option<String>,
    pub data_refresh_interval: Duration,
    pub rate_grid: RateGrid,
    pub sp_yield_split: Dnum,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let subgraph_url = required(&env_map, "SUBGRAPH_URL")?;
        let rpc_url = required(&env_map, "RPC_URL")?;

        let staking_address = parse_address(&env_map, "STAKING_ADDRESS")?
            .ok_or_else(|| ConfigError::MissingEnv("STAKING_ADDRESS".to_string()))?;

        let collaterals = parse_collaterals(&env_map)?;

        let chain_block_explorer_url = env_map
            .get("CHAIN_BLOCK_EXPLORER_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let refresh_ms = env_map
            .get("DATA_REFRESH_INTERVAL_MS")
            .map(|s| s.as_str())
            .unwrap_or("15000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "DATA_REFRESH_INTERVAL_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let rate_min = parse_percent(&env_map, "INTEREST_RATE_MIN", "0.5")?;
        let rate_max = parse_percent(&env_map, "INTEREST_RATE_MAX", "25")?;
        let rate_increment = parse_percent(&env_map, "INTEREST_RATE_INCREMENT", "0.1")?;
        let rate_grid = RateGrid::new(rate_min, rate_max, rate_increment).ok_or_else(|| {
            ConfigError::InvalidValue(
                "INTEREST_RATE_INCREMENT".to_string(),
                format!(
                    "increment must be positive, INTEREST_RATE_MIN <= INTEREST_RATE_MAX \
                     and the grid at most {} points",
                    MAX_GRID_STEPS
                ),
            )
        })?;

        let sp_yield_split = env_map
            .get("SP_YIELD_SPLIT")
            .map(|s| s.as_str())
            .unwrap_or("0.75")
            .parse::<Dnum>()
            .ok()
            .filter(|split| !split.is_negative() && *split <= Dnum::from_int(1))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SP_YIELD_SPLIT".to_string(),
                    "must be a decimal between 0 and 1".to_string(),
                )
            })?;

        Ok(Config {
            port,
            subgraph_url,
            rpc_url,
            staking_address,
            collaterals,
            chain_block_explorer_url,
            data_refresh_interval: Duration::from_millis(refresh_ms),
            rate_grid,
            sp_yield_split,
        })
    }
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_address(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<Option<Address>, ConfigError> {
    match env_map.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        Some(raw) => Address::from_str(raw).map(Some).map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("invalid address {}", raw))
        }),
        None => Ok(None),
    }
}

fn parse_percent(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Percent, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .parse::<Percent>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), "must be a decimal".to_string()))
}

/// `COLLATERALS=ETH,RETH,STETH` plus optional `COLL_<i>_<CONTRACT>` addresses per branch.
fn parse_collaterals(env_map: &HashMap<String, String>) -> Result<CollateralCatalog, ConfigError> {
    let symbols = env_map
        .get("COLLATERALS")
        .map(|s| s.as_str())
        .unwrap_or("ETH,RETH,STETH");

    let mut branches = Vec::new();
    for (i, symbol) in symbols
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .enumerate()
    {
        let symbol = CollateralSymbol::from_str(symbol)
            .map_err(|e| ConfigError::InvalidValue("COLLATERALS".to_string(), e.to_string()))?;
        let contracts = CollateralContracts {
            trove_nft: parse_address(env_map, &format!("COLL_{}_TROVE_NFT", i))?,
            trove_manager: parse_address(env_map, &format!("COLL_{}_TROVE_MANAGER", i))?,
            active_pool: parse_address(env_map, &format!("COLL_{}_ACTIVE_POOL", i))?,
            stability_pool: parse_address(env_map, &format!("COLL_{}_STABILITY_POOL", i))?,
        };
        branches.push((symbol, contracts));
    }

    if branches.is_empty() {
        return Err(ConfigError::InvalidValue(
            "COLLATERALS".to_string(),
            "at least one collateral is required".to_string(),
        ));
    }

    Ok(CollateralCatalog::new(branches))
}
