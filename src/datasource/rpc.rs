//! Contract reads over JSON-RPC `eth_call`.

use super::http::post_json;
use super::{ChainReader, DataSourceError};
use crate::domain::{
    Address, CollIndex, CollateralCatalog, CollateralContracts, Dnum, SpYieldGainParams, TroveId,
};
use async_trait::async_trait;
use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use reqwest::Client;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};
use tracing::debug;

/// Decimals of `aggWeightedDebtSum` (debt x rate, both 18-decimal).
const WEIGHTED_DEBT_DECIMALS: u32 = 36;

/// First four bytes of keccak256 of the canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// ABI call data: selector followed by 32-byte argument words, hex encoded.
pub fn call_data(signature: &str, args: &[[u8; 32]]) -> String {
    let mut data = selector(signature).to_vec();
    for arg in args {
        data.extend_from_slice(arg);
    }
    format!("0x{}", hex::encode(data))
}

/// Decode the first 32-byte word of an `eth_call` result as an unsigned integer.
pub fn decode_uint(result: &str) -> Result<BigUint, DataSourceError> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    let bytes = hex::decode(digits)
        .map_err(|e| DataSourceError::ParseError(format!("Invalid call result: {}", e)))?;
    if bytes.len() < 32 {
        return Err(DataSourceError::ParseError(format!(
            "Call result too short: {} bytes",
            bytes.len()
        )));
    }
    Ok(BigUint::from_bytes_be(&bytes[..32]))
}

#[derive(Debug, Clone)]
pub struct RpcChainReader {
    client: Client,
    url: String,
    catalog: CollateralCatalog,
    staking: Address,
    sp_yield_split: Dnum,
}

impl RpcChainReader {
    pub fn new(url: String, catalog: CollateralCatalog, staking: Address, sp_yield_split: Dnum) -> Self {
        Self {
            client: Client::new(),
            url,
            catalog,
            staking,
            sp_yield_split,
        }
    }

    async fn call_uint(
        &self,
        to: &Address,
        signature: &str,
        args: &[[u8; 32]],
    ) -> Result<BigUint, DataSourceError> {
        debug!("eth_call to={} fn={}", to, signature);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": to.to_hex(), "data": call_data(signature, args) }, "latest"],
        });
        let response = post_json(&self.client, &self.url, &payload).await?;
        decode_uint(rpc_result(&response)?)
    }

    fn contracts(&self, coll_index: CollIndex) -> Result<&CollateralContracts, DataSourceError> {
        self.catalog
            .get(coll_index)
            .map(|token| &token.contracts)
            .map_err(|e| DataSourceError::Other(e.to_string()))
    }
}

fn rpc_result(response: &Value) -> Result<&str, DataSourceError> {
    if let Some(error) = response.get("error") {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown JSON-RPC error");
        return Err(DataSourceError::Remote(message.to_string()));
    }
    response
        .get("result")
        .and_then(|r| r.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing result field".to_string()))
}

fn require(address: Option<Address>, what: &str, coll_index: CollIndex) -> Result<Address, DataSourceError> {
    address.ok_or_else(|| {
        DataSourceError::Other(format!(
            "No {} address configured for collateral {}",
            what, coll_index
        ))
    })
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn stake(&self, owner: &Address) -> Result<Dnum, DataSourceError> {
        let raw = self
            .call_uint(&self.staking, "stakes(address)", &[address_word(owner)])
            .await?;
        Ok(Dnum::from_raw(BigInt::from(raw)))
    }

    async fn total_staked(&self) -> Result<Dnum, DataSourceError> {
        let raw = self
            .call_uint(&self.staking, "totalLQTYStaked()", &[])
            .await?;
        Ok(Dnum::from_raw(BigInt::from(raw)))
    }

    async fn sp_yield_gain_params(
        &self,
        coll_index: CollIndex,
    ) -> Result<SpYieldGainParams, DataSourceError> {
        let contracts = self.contracts(coll_index)?;
        let active_pool = require(contracts.active_pool, "active pool", coll_index)?;
        let stability_pool = require(contracts.stability_pool, "stability pool", coll_index)?;

        let (weighted_debt, last_update, total_deposits, pending) = futures::try_join!(
            self.call_uint(&active_pool, "aggWeightedDebtSum()", &[]),
            self.call_uint(&active_pool, "lastAggUpdateTime()", &[]),
            self.call_uint(&stability_pool, "getTotalBoldDeposits()", &[]),
            self.call_uint(&stability_pool, "getYieldGainsPending()", &[]),
        )?;

        let last_agg_update_time = last_update.to_i64().ok_or_else(|| {
            DataSourceError::ParseError("lastAggUpdateTime out of range".to_string())
        })?;

        Ok(SpYieldGainParams {
            agg_weighted_debt_sum: Dnum::from_raw_with_decimals(
                BigInt::from(weighted_debt),
                WEIGHTED_DEBT_DECIMALS,
            ),
            last_agg_update_time,
            sp_yield_split: self.sp_yield_split.clone(),
            total_bold_deposits: Dnum::from_raw(BigInt::from(total_deposits)),
            yield_gains_pending: Dnum::from_raw(BigInt::from(pending)),
        })
    }

    async fn depositor_yield_gain(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Dnum, DataSourceError> {
        let contracts = self.contracts(coll_index)?;
        let stability_pool = require(contracts.stability_pool, "stability pool", coll_index)?;
        let raw = self
            .call_uint(
                &stability_pool,
                "getDepositorYieldGain(address)",
                &[address_word(owner)],
            )
            .await?;
        Ok(Dnum::from_raw(BigInt::from(raw)))
    }

    async fn trove_status_code(
        &self,
        coll_index: CollIndex,
        trove_id: &TroveId,
    ) -> Result<i64, DataSourceError> {
        let contracts = self.contracts(coll_index)?;
        let trove_manager = require(contracts.trove_manager, "trove manager", coll_index)?;
        let raw = self
            .call_uint(&trove_manager, "getTroveStatus(uint256)", &[trove_id.to_word()])
            .await?;
        raw.to_i64()
            .ok_or_else(|| DataSourceError::ParseError(format!("Trove status out of range: {}", raw)))
    }
}
