//! GraphQL client for the protocol subgraph.

use super::http::post_json;
use super::{DataSourceError, Indexer};
use crate::domain::{
    Address, CollIndex, DepositSnapshot, Dnum, EpochScale, InterestRateBracket, PoolSum,
    StabilityPoolDeposit,
};
use async_trait::async_trait;
use num_bigint::BigInt;
use reqwest::Client;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, warn};

/// Decimals of the product accumulator P as stored by the indexer. S is stored
/// at 36 decimals and kept raw as a `PoolSum`.
pub const P_DECIMALS: u32 = 18;

const STABILITY_POOL_DEPOSIT_QUERY: &str = r#"
query StabilityPoolDeposit($id: ID!) {
  stabilityPoolDeposit(id: $id) {
    id
    deposit
    depositor
    collateral { collIndex }
    snapshot { epoch scale P S }
  }
}"#;

const EPOCH_SCALE_QUERY: &str = r#"
query StabilityPoolEpochScale($id: ID!) {
  stabilityPoolEpochScale(id: $id) { id S }
}"#;

const INTEREST_RATE_BRACKETS_QUERY: &str = r#"
query InterestRateBrackets($collId: String!) {
  interestRateBrackets(first: 1000, where: { collateral: $collId }, orderBy: rate) {
    rate
    totalDebt
  }
}"#;

const STABILITY_POOL_QUERY: &str = r#"
query StabilityPool($id: ID!) {
  stabilityPool(id: $id) { id totalDeposited }
}"#;

#[derive(Debug, Clone)]
pub struct SubgraphIndexer {
    client: Client,
    url: String,
}

impl SubgraphIndexer {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    async fn query(&self, query: &str, variables: Value) -> Result<Value, DataSourceError> {
        let payload = json!({ "query": query, "variables": variables });
        let response = post_json(&self.client, &self.url, &payload).await?;
        graphql_data(response)
    }
}

#[async_trait]
impl Indexer for SubgraphIndexer {
    async fn stability_pool_deposit(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Option<StabilityPoolDeposit>, DataSourceError> {
        let id = format!("{}:{}", coll_index, owner);
        debug!("Fetching stability pool deposit id={}", id);

        let data = self
            .query(STABILITY_POOL_DEPOSIT_QUERY, json!({ "id": id }))
            .await?;
        match data.get("stabilityPoolDeposit") {
            None | Some(Value::Null) => Ok(None),
            Some(record) => parse_deposit(record).map(Some),
        }
    }

    async fn stability_pool_epoch_scale(
        &self,
        coll_index: CollIndex,
        epoch: u64,
        scale: u64,
    ) -> Result<Option<EpochScale>, DataSourceError> {
        let id = format!("{}:{}:{}", coll_index, epoch, scale);
        debug!("Fetching stability pool epoch scale id={}", id);

        let data = self.query(EPOCH_SCALE_QUERY, json!({ "id": id })).await?;
        match data.get("stabilityPoolEpochScale") {
            None | Some(Value::Null) => Ok(None),
            Some(record) => Ok(Some(EpochScale {
                epoch,
                scale,
                s: PoolSum::from_raw(big_field(record, "S")?),
            })),
        }
    }

    async fn interest_rate_brackets(
        &self,
        coll_index: CollIndex,
    ) -> Result<Vec<InterestRateBracket>, DataSourceError> {
        debug!("Fetching interest rate brackets coll_index={}", coll_index);

        let data = self
            .query(
                INTEREST_RATE_BRACKETS_QUERY,
                json!({ "collId": coll_index.to_string() }),
            )
            .await?;
        let records = data
            .get("interestRateBrackets")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                DataSourceError::ParseError("Expected interestRateBrackets array".to_string())
            })?;

        let mut brackets = Vec::with_capacity(records.len());
        for record in records {
            match parse_bracket(record) {
                Ok(bracket) => brackets.push(bracket),
                Err(e) => warn!("Failed to parse interest rate bracket: {}", e),
            }
        }
        Ok(brackets)
    }

    async fn stability_pool_total_deposited(
        &self,
        coll_index: CollIndex,
    ) -> Result<Dnum, DataSourceError> {
        debug!("Fetching stability pool coll_index={}", coll_index);

        let data = self
            .query(STABILITY_POOL_QUERY, json!({ "id": coll_index.to_string() }))
            .await?;
        match data.get("stabilityPool") {
            None | Some(Value::Null) => Ok(Dnum::zero()),
            Some(pool) => Ok(Dnum::from_raw(big_field(pool, "totalDeposited")?)),
        }
    }
}

/// Unwrap a GraphQL response envelope, surfacing the first reported error.
fn graphql_data(response: Value) -> Result<Value, DataSourceError> {
    if let Some(first) = response
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|errors| errors.first())
    {
        let message = first
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown GraphQL error");
        return Err(DataSourceError::Remote(message.to_string()));
    }
    response
        .get("data")
        .cloned()
        .ok_or_else(|| DataSourceError::ParseError("Missing data field".to_string()))
}

/// BigInt scalars arrive as decimal strings; small ints may arrive as numbers.
fn big_field(record: &Value, field: &str) -> Result<BigInt, DataSourceError> {
    match record.get(field) {
        Some(Value::String(s)) => BigInt::from_str(s)
            .map_err(|_| DataSourceError::ParseError(format!("Invalid {}: {}", field, s))),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(BigInt::from)
            .ok_or_else(|| DataSourceError::ParseError(format!("Invalid {}: {}", field, n))),
        _ => Err(DataSourceError::ParseError(format!("Missing {} field", field))),
    }
}

fn u64_field(record: &Value, field: &str) -> Result<u64, DataSourceError> {
    let value = big_field(record, field)?;
    u64::try_from(value)
        .map_err(|_| DataSourceError::ParseError(format!("Out of range {}", field)))
}

fn parse_deposit(record: &Value) -> Result<StabilityPoolDeposit, DataSourceError> {
    let depositor = record
        .get("depositor")
        .and_then(|v| v.as_str())
        .ok_or_else(|| DataSourceError::ParseError("Missing depositor field".to_string()))?
        .to_string();

    let coll_index = record
        .get("collateral")
        .and_then(|c| c.get("collIndex"))
        .and_then(|v| v.as_i64())
        .ok_or_else(|| DataSourceError::ParseError("Missing collateral.collIndex field".to_string()))?;

    let snapshot = record
        .get("snapshot")
        .ok_or_else(|| DataSourceError::ParseError("Missing snapshot field".to_string()))?;

    Ok(StabilityPoolDeposit {
        depositor,
        coll_index,
        deposit: Dnum::from_raw(big_field(record, "deposit")?),
        snapshot: DepositSnapshot {
            epoch: u64_field(snapshot, "epoch")?,
            scale: u64_field(snapshot, "scale")?,
            p: Dnum::from_raw_with_decimals(big_field(snapshot, "P")?, P_DECIMALS),
            s: PoolSum::from_raw(big_field(snapshot, "S")?),
        },
    })
}

fn parse_bracket(record: &Value) -> Result<InterestRateBracket, DataSourceError> {
    Ok(InterestRateBracket {
        rate: Dnum::from_raw(big_field(record, "rate")?),
        total_debt: Dnum::from_raw(big_field(record, "totalDebt")?),
    })
}
