//! Mock data source for testing without network calls.

use super::{ChainReader, DataSourceError, Indexer};
use crate::domain::{
    Address, CollIndex, Dnum, EpochScale, InterestRateBracket, SpYieldGainParams,
    StabilityPoolDeposit, TroveId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory indexer and chain reader returning predefined data.
#[derive(Debug, Default)]
pub struct MockDataSource {
    deposits: HashMap<(CollIndex, Address), StabilityPoolDeposit>,
    epoch_scales: HashMap<(CollIndex, u64, u64), EpochScale>,
    brackets: HashMap<CollIndex, Vec<InterestRateBracket>>,
    total_deposited: HashMap<CollIndex, Dnum>,
    stakes: HashMap<Address, Dnum>,
    total_staked: Dnum,
    yield_params: HashMap<CollIndex, SpYieldGainParams>,
    yield_gains: HashMap<(CollIndex, Address), Dnum>,
    trove_statuses: HashMap<(CollIndex, TroveId), i64>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deposit(mut self, coll_index: CollIndex, owner: Address, deposit: StabilityPoolDeposit) -> Self {
        self.deposits.insert((coll_index, owner), deposit);
        self
    }

    pub fn with_epoch_scale(mut self, coll_index: CollIndex, epoch_scale: EpochScale) -> Self {
        self.epoch_scales
            .insert((coll_index, epoch_scale.epoch, epoch_scale.scale), epoch_scale);
        self
    }

    pub fn with_brackets(mut self, coll_index: CollIndex, brackets: Vec<InterestRateBracket>) -> Self {
        self.brackets.insert(coll_index, brackets);
        self
    }

    pub fn with_total_deposited(mut self, coll_index: CollIndex, total: Dnum) -> Self {
        self.total_deposited.insert(coll_index, total);
        self
    }

    pub fn with_stake(mut self, owner: Address, stake: Dnum) -> Self {
        self.stakes.insert(owner, stake);
        self
    }

    pub fn with_total_staked(mut self, total: Dnum) -> Self {
        self.total_staked = total;
        self
    }

    pub fn with_yield_params(mut self, coll_index: CollIndex, params: SpYieldGainParams) -> Self {
        self.yield_params.insert(coll_index, params);
        self
    }

    pub fn with_yield_gain(mut self, coll_index: CollIndex, owner: Address, gain: Dnum) -> Self {
        self.yield_gains.insert((coll_index, owner), gain);
        self
    }

    pub fn with_trove_status(mut self, coll_index: CollIndex, trove_id: TroveId, code: i64) -> Self {
        self.trove_statuses.insert((coll_index, trove_id), code);
        self
    }

    /// Make every call fail with `DataSourceError::Other(message)`.
    pub fn with_failure(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// Number of calls served so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<(), DataSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(DataSourceError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Indexer for MockDataSource {
    async fn stability_pool_deposit(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Option<StabilityPoolDeposit>, DataSourceError> {
        self.record_call()?;
        Ok(self.deposits.get(&(coll_index, *owner)).cloned())
    }

    async fn stability_pool_epoch_scale(
        &self,
        coll_index: CollIndex,
        epoch: u64,
        scale: u64,
    ) -> Result<Option<EpochScale>, DataSourceError> {
        self.record_call()?;
        Ok(self.epoch_scales.get(&(coll_index, epoch, scale)).cloned())
    }

    async fn interest_rate_brackets(
        &self,
        coll_index: CollIndex,
    ) -> Result<Vec<InterestRateBracket>, DataSourceError> {
        self.record_call()?;
        Ok(self.brackets.get(&coll_index).cloned().unwrap_or_default())
    }

    async fn stability_pool_total_deposited(
        &self,
        coll_index: CollIndex,
    ) -> Result<Dnum, DataSourceError> {
        self.record_call()?;
        Ok(self.total_deposited.get(&coll_index).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl ChainReader for MockDataSource {
    async fn stake(&self, owner: &Address) -> Result<Dnum, DataSourceError> {
        self.record_call()?;
        Ok(self.stakes.get(owner).cloned().unwrap_or_default())
    }

    async fn total_staked(&self) -> Result<Dnum, DataSourceError> {
        self.record_call()?;
        Ok(self.total_staked.clone())
    }

    async fn sp_yield_gain_params(
        &self,
        coll_index: CollIndex,
    ) -> Result<SpYieldGainParams, DataSourceError> {
        self.record_call()?;
        self.yield_params
            .get(&coll_index)
            .cloned()
            .ok_or_else(|| DataSourceError::Other(format!("no yield params for {}", coll_index)))
    }

    async fn depositor_yield_gain(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Dnum, DataSourceError> {
        self.record_call()?;
        Ok(self
            .yield_gains
            .get(&(coll_index, *owner))
            .cloned()
            .unwrap_or_default())
    }

    async fn trove_status_code(
        &self,
        coll_index: CollIndex,
        trove_id: &TroveId,
    ) -> Result<i64, DataSourceError> {
        self.record_call()?;
        Ok(self
            .trove_statuses
            .get(&(coll_index, trove_id.clone()))
            .copied()
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CollateralCatalog, PoolSum};
    use std::str::FromStr;

    fn owner() -> Address {
        Address::from_str("0x1111111111111111111111111111111111111111").unwrap()
    }

    #[tokio::test]
    async fn test_mock_stake_defaults_to_zero() {
        let mock = MockDataSource::new().with_total_staked(Dnum::from_int(10));
        assert_eq!(mock.stake(&owner()).await.unwrap(), Dnum::zero());
        assert_eq!(mock.total_staked().await.unwrap(), Dnum::from_int(10));
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_epoch_scale_lookup() {
        let coll = CollateralCatalog::default().coll_index(1).unwrap();
        let mock = MockDataSource::new().with_epoch_scale(
            coll,
            EpochScale {
                epoch: 0,
                scale: 2,
                s: PoolSum::from_int(5),
            },
        );
        let found = mock.stability_pool_epoch_scale(coll, 0, 2).await.unwrap();
        assert_eq!(found.map(|e| e.s), Some(PoolSum::from_int(5)));
        assert!(mock.stability_pool_epoch_scale(coll, 0, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockDataSource::new().with_failure("boom");
        match mock.total_staked().await {
            Err(DataSourceError::Other(msg)) => assert_eq!(msg, "boom"),
            other => panic!("Expected failure, got {:?}", other),
        }
    }
}
