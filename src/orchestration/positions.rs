//! Resolve every query a derived view depends on, then run the pure derivation.

use super::query_cache::{QueryCache, QueryKey, QueryStatus};
use crate::config::Config;
use crate::datasource::{ChainReader, DataSourceError, Indexer};
use crate::domain::{
    compute_trove_id, trove_nft_url, Address, CollIndex, CollateralCatalog, Dnum, EarnPool,
    EarnPosition, InterestRateBracket, PoolSum, PrefixedTroveId, SpYieldGainParams,
    StabilityPoolDeposit, StakePosition, TroveId, TroveStatus, ValidationError,
};
use crate::engine::{
    build_interest_rate_chart, calculate_stability_pool_apr, continuous_bold_gain, earn_position,
    stake_position_from_reads, ChartPoint, RateGrid,
};
use num_bigint::BigUint;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TroveView {
    pub coll_index: CollIndex,
    pub trove_id: TroveId,
    pub prefixed_trove_id: PrefixedTroveId,
    pub status: TroveStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_url: Option<String>,
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[derive(Clone)]
pub struct PositionService {
    indexer: Arc<dyn Indexer>,
    chain: Arc<dyn ChainReader>,
    cache: Arc<QueryCache>,
    catalog: CollateralCatalog,
    rate_grid: RateGrid,
    explorer_url: Option<String>,
    clock: fn() -> i64,
}

impl PositionService {
    pub fn new(
        indexer: Arc<dyn Indexer>,
        chain: Arc<dyn ChainReader>,
        cache: Arc<QueryCache>,
        config: &Config,
    ) -> Self {
        Self {
            indexer,
            chain,
            cache,
            catalog: config.collaterals.clone(),
            rate_grid: config.rate_grid,
            explorer_url: config.chain_block_explorer_url.clone(),
            clock: unix_now,
        }
    }

    /// Replace the wall clock (seconds since Unix epoch) used for accruing yield.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &CollateralCatalog {
        &self.catalog
    }

    pub fn refresh_interval(&self) -> Duration {
        self.cache.refresh_interval()
    }

    pub fn stake_key(owner: &Address) -> QueryKey {
        QueryKey::new("stake").param(owner)
    }

    pub fn total_staked_key() -> QueryKey {
        QueryKey::new("totalStaked")
    }

    pub fn brackets_key(coll_index: CollIndex) -> QueryKey {
        QueryKey::new("interestRateBrackets").param(coll_index)
    }

    async fn sp_deposit(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Option<StabilityPoolDeposit>, DataSourceError> {
        let key = QueryKey::new("stabilityPoolDeposit").param(coll_index).param(owner);
        self.cache
            .get_or_fetch(key, || self.indexer.stability_pool_deposit(coll_index, owner))
            .await
    }

    /// Pool sum at (epoch, scale), `None` if the pool never reached that scale.
    async fn epoch_scale_sum(
        &self,
        coll_index: CollIndex,
        epoch: u64,
        scale: u64,
    ) -> Result<Option<PoolSum>, DataSourceError> {
        let key = QueryKey::new("stabilityPoolEpochScale")
            .param(coll_index)
            .param(epoch)
            .param(scale);
        let epoch_scale = self
            .cache
            .get_or_fetch(key, || {
                self.indexer
                    .stability_pool_epoch_scale(coll_index, epoch, scale)
            })
            .await?;
        Ok(epoch_scale.map(|e| e.s))
    }

    async fn yield_params(&self, coll_index: CollIndex) -> Result<SpYieldGainParams, DataSourceError> {
        let key = QueryKey::new("spYieldGainParams").param(coll_index);
        self.cache
            .get_or_fetch(key, || self.chain.sp_yield_gain_params(coll_index))
            .await
    }

    async fn depositor_yield_gain(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Dnum, DataSourceError> {
        let key = QueryKey::new("depositorYieldGain").param(coll_index).param(owner);
        self.cache
            .get_or_fetch(key, || self.chain.depositor_yield_gain(coll_index, owner))
            .await
    }

    async fn total_deposited(&self, coll_index: CollIndex) -> Result<Dnum, DataSourceError> {
        let key = QueryKey::new("stabilityPoolTotalDeposited").param(coll_index);
        self.cache
            .get_or_fetch(key, || self.indexer.stability_pool_total_deposited(coll_index))
            .await
    }

    async fn brackets(&self, coll_index: CollIndex) -> Result<Vec<InterestRateBracket>, DataSourceError> {
        self.cache
            .get_or_fetch(Self::brackets_key(coll_index), || {
                self.indexer.interest_rate_brackets(coll_index)
            })
            .await
    }

    pub async fn earn_pool(&self, coll_index: CollIndex) -> Result<EarnPool, ServiceError> {
        let collateral = self.catalog.get(coll_index)?.clone();
        let (total_deposited, params) =
            futures::try_join!(self.total_deposited(coll_index), self.yield_params(coll_index))?;

        Ok(EarnPool {
            collateral,
            apr: calculate_stability_pool_apr(&params),
            total_deposited,
        })
    }

    /// `Ok(None)` when `owner` has no deposit in this pool.
    pub async fn earn_position(
        &self,
        coll_index: CollIndex,
        owner: &Address,
    ) -> Result<Option<EarnPosition>, ServiceError> {
        let Some(sp_deposit) = self.sp_deposit(coll_index, owner).await? else {
            return Ok(None);
        };
        let snapshot = &sp_deposit.snapshot;

        let (s_at_scale, s_at_next_scale, params, recorded_gain) = futures::try_join!(
            self.epoch_scale_sum(coll_index, snapshot.epoch, snapshot.scale),
            self.epoch_scale_sum(coll_index, snapshot.epoch, snapshot.scale + 1),
            self.yield_params(coll_index),
            self.depositor_yield_gain(coll_index, owner),
        )?;

        // A missing reading at the snapshot scale means no growth since the deposit.
        let s_at_scale = s_at_scale.unwrap_or_else(|| snapshot.s.clone());
        let s_at_next_scale = s_at_next_scale.unwrap_or_default();

        let bold_gain =
            continuous_bold_gain(&params, &sp_deposit.deposit, &recorded_gain, (self.clock)());
        let position = earn_position(
            &sp_deposit,
            &s_at_scale,
            &s_at_next_scale,
            bold_gain,
            &self.catalog,
        )?;
        Ok(Some(position))
    }

    pub async fn stake_position(&self, owner: &Address) -> Result<StakePosition, ServiceError> {
        let (deposit, total_staked) = futures::try_join!(
            self.cache
                .get_or_fetch(Self::stake_key(owner), || self.chain.stake(owner)),
            self.cache
                .get_or_fetch(Self::total_staked_key(), || self.chain.total_staked()),
        )?;
        Ok(stake_position_from_reads(*owner, deposit, total_staked))
    }

    /// Stake position from whatever is cached, without fetching.
    pub fn stake_position_status(&self, owner: &Address) -> QueryStatus<StakePosition> {
        let owner = *owner;
        self.cache
            .status::<Dnum>(&Self::stake_key(&owner))
            .zip(self.cache.status::<Dnum>(&Self::total_staked_key()))
            .map(|(deposit, total_staked)| stake_position_from_reads(owner, deposit, total_staked))
    }

    pub async fn interest_rate_chart(&self, coll_index: CollIndex) -> Result<Vec<ChartPoint>, ServiceError> {
        self.catalog.get(coll_index)?;
        let brackets = self.brackets(coll_index).await?;
        Ok(build_interest_rate_chart(&brackets, &self.rate_grid))
    }

    pub fn interest_rate_chart_status(&self, coll_index: CollIndex) -> QueryStatus<Vec<ChartPoint>> {
        self.cache
            .status::<Vec<InterestRateBracket>>(&Self::brackets_key(coll_index))
            .map(|brackets| build_interest_rate_chart(&brackets, &self.rate_grid))
    }

    /// Decode a `collIndex:troveId` key and look up the trove's status.
    pub async fn trove(&self, prefixed: &str) -> Result<TroveView, ServiceError> {
        let prefixed = PrefixedTroveId::parse(prefixed, &self.catalog)?;
        let coll_index = prefixed.coll_index;
        let trove_id = prefixed.trove_id.clone();

        let key = QueryKey::new("troveStatus").param(coll_index).param(&trove_id);
        let code = self
            .cache
            .get_or_fetch(key, || self.chain.trove_status_code(coll_index, &trove_id))
            .await?;
        let status = TroveStatus::from_code(code)?;

        let token = self.catalog.get(coll_index)?;
        let nft_url = match (&self.explorer_url, &token.contracts.trove_nft) {
            (Some(explorer), Some(nft)) => Some(trove_nft_url(explorer, nft, &trove_id)),
            _ => None,
        };

        Ok(TroveView {
            coll_index,
            trove_id,
            prefixed_trove_id: prefixed,
            status,
            status_label: status.label(),
            nft_url,
        })
    }

    /// Identifier of `owner`'s `owner_index`-th trove on collateral `coll_index`.
    pub fn prefixed_trove_id_for(
        &self,
        owner: &Address,
        owner_index: &BigUint,
        coll_index: i64,
    ) -> Result<PrefixedTroveId, ValidationError> {
        let coll_index = self.catalog.coll_index(coll_index)?;
        let trove_id = compute_trove_id(owner, owner_index)?;
        Ok(PrefixedTroveId::new(coll_index, trove_id))
    }
}
