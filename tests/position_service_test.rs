use liquity_views::datasource::MockDataSource;
use liquity_views::domain::{
    Address, CollIndex, CollateralCatalog, DepositSnapshot, Dnum, EpochScale,
    InterestRateBracket, PoolSum, SpYieldGainParams, StabilityPoolDeposit, ValidationError,
};
use liquity_views::engine::{RateGrid, ONE_YEAR_SECONDS, SCALE_FACTOR};
use liquity_views::orchestration::{PositionService, QueryCache, QueryStatus, ServiceError};
use liquity_views::Config;
use num_bigint::BigUint;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

const OWNER: &str = "0x2222222222222222222222222222222222222222";

fn d(s: &str) -> Dnum {
    Dnum::from_str(s).unwrap()
}

fn owner() -> Address {
    Address::from_str(OWNER).unwrap()
}

fn coll(i: i64) -> CollIndex {
    CollateralCatalog::default().coll_index(i).unwrap()
}

fn test_config() -> Config {
    Config {
        port: 0,
        subgraph_url: "http://example.invalid".to_string(),
        rpc_url: "http://example.invalid".to_string(),
        staking_address: Address::ZERO,
        collaterals: CollateralCatalog::default(),
        chain_block_explorer_url: None,
        data_refresh_interval: Duration::from_secs(60),
        rate_grid: RateGrid::default(),
        sp_yield_split: d("0.75"),
    }
}

struct Harness {
    mock: Arc<MockDataSource>,
    cache: Arc<QueryCache>,
    service: PositionService,
}

fn harness(mock: MockDataSource) -> Harness {
    let config = test_config();
    let mock = Arc::new(mock);
    let cache = Arc::new(QueryCache::new(config.data_refresh_interval));
    let service = PositionService::new(mock.clone(), mock.clone(), cache.clone(), &config)
        .with_clock(|| ONE_YEAR_SECONDS);
    Harness {
        mock,
        cache,
        service,
    }
}

fn sp_deposit(depositor: &str, scale: u64) -> StabilityPoolDeposit {
    StabilityPoolDeposit {
        depositor: depositor.to_string(),
        coll_index: 0,
        deposit: d("10"),
        snapshot: DepositSnapshot {
            epoch: 0,
            scale,
            p: d("1"),
            s: PoolSum::from_int(2),
        },
    }
}

fn quiet_params() -> SpYieldGainParams {
    SpYieldGainParams {
        agg_weighted_debt_sum: Dnum::zero(),
        last_agg_update_time: 0,
        sp_yield_split: d("0.75"),
        total_bold_deposits: d("100"),
        yield_gains_pending: Dnum::zero(),
    }
}

#[tokio::test]
async fn test_stake_position_is_cached() {
    let h = harness(
        MockDataSource::new()
            .with_stake(owner(), Dnum::from_int(10))
            .with_total_staked(Dnum::from_int(40)),
    );

    let first = assert_ok!(h.service.stake_position(&owner()).await);
    assert_eq!(first.share, d("0.25"));
    assert_eq!(h.mock.call_count(), 2);

    let second = assert_ok!(h.service.stake_position(&owner()).await);
    assert_eq!(first, second);
    assert_eq!(h.mock.call_count(), 2);

    h.cache.invalidate(&PositionService::stake_key(&owner()));
    assert_ok!(h.service.stake_position(&owner()).await);
    assert_eq!(h.mock.call_count(), 3);
}

#[tokio::test]
async fn test_concurrent_readers_share_one_fetch() {
    let h = harness(MockDataSource::new().with_total_staked(Dnum::from_int(1)));

    let account = owner();
    let (a, b) = tokio::join!(
        h.service.stake_position(&account),
        h.service.stake_position(&account)
    );
    assert_eq!(assert_ok!(a), assert_ok!(b));
    assert_eq!(h.mock.call_count(), 2);
}

#[tokio::test]
async fn test_stake_status_not_ready_until_fetched() {
    let h = harness(
        MockDataSource::new()
            .with_stake(owner(), Dnum::from_int(1))
            .with_total_staked(Dnum::from_int(4)),
    );

    assert_eq!(h.service.stake_position_status(&owner()), QueryStatus::Pending);

    assert_ok!(h.service.stake_position(&owner()).await);
    let position = h.service.stake_position_status(&owner()).ready().unwrap();
    assert_eq!(position.share, d("0.25"));
}

#[tokio::test]
async fn test_failed_fetch_is_reported_not_cached() {
    let h = harness(MockDataSource::new().with_failure("rpc down"));

    let result = h.service.stake_position(&owner()).await;
    assert!(matches!(result, Err(ServiceError::DataSource(_))));
    assert!(matches!(
        h.service.stake_position_status(&owner()),
        QueryStatus::Failed(_)
    ));

    // Nothing was cached, so the next read fetches again.
    let calls = h.mock.call_count();
    let _ = h.service.stake_position(&owner()).await;
    assert!(h.mock.call_count() > calls);
}

#[tokio::test]
async fn test_chart_status_follows_brackets_query() {
    let h = harness(MockDataSource::new().with_brackets(
        coll(0),
        vec![InterestRateBracket {
            rate: d("0.005"),
            total_debt: d("10"),
        }],
    ));

    assert_eq!(h.service.interest_rate_chart_status(coll(0)), QueryStatus::Pending);

    let chart = assert_ok!(h.service.interest_rate_chart(coll(0)).await);
    assert_eq!(chart[0].debt, d("10"));
    assert_eq!(chart[0].size, 1.0);

    let status = h.service.interest_rate_chart_status(coll(0));
    assert_eq!(status.ready(), Some(chart));
}

#[tokio::test]
async fn test_earn_position_accrues_pending_yield() {
    let params = SpYieldGainParams {
        agg_weighted_debt_sum: d("1000"),
        last_agg_update_time: 0,
        sp_yield_split: d("0.75"),
        total_bold_deposits: d("7500"),
        yield_gains_pending: Dnum::zero(),
    };
    let mut deposit = sp_deposit(OWNER, 0);
    deposit.deposit = d("750");

    let h = harness(
        MockDataSource::new()
            .with_deposit(coll(0), owner(), deposit)
            .with_yield_params(coll(0), params)
            .with_yield_gain(coll(0), owner(), d("5")),
    );

    let position = assert_ok!(h.service.earn_position(coll(0), &owner()).await).unwrap();
    // One year of 1000 interest, 75% to the pool, 10% of the pool is ours.
    assert_eq!(position.rewards.bold, d("80"));
    // No epoch scale readings: the pool sum has not moved since the snapshot.
    assert_eq!(position.rewards.coll, Dnum::zero());
}

#[tokio::test]
async fn test_earn_position_across_scale_change() {
    let h = harness(
        MockDataSource::new()
            .with_deposit(coll(0), owner(), sp_deposit(OWNER, 0))
            .with_epoch_scale(
                coll(0),
                EpochScale {
                    epoch: 0,
                    scale: 0,
                    s: PoolSum::from_int(5),
                },
            )
            .with_epoch_scale(
                coll(0),
                EpochScale {
                    epoch: 0,
                    scale: 1,
                    s: PoolSum::from_int(3 * SCALE_FACTOR as i64),
                },
            )
            .with_yield_params(coll(0), quiet_params()),
    );

    let position = assert_ok!(h.service.earn_position(coll(0), &owner()).await).unwrap();
    assert_eq!(position.owner, owner());
    assert_eq!(position.coll_index, coll(0));
    assert_eq!(position.rewards.coll, d("60"));
    assert_eq!(position.rewards.bold, Dnum::zero());
}

#[tokio::test]
async fn test_earn_position_absent_deposit() {
    let h = harness(MockDataSource::new());
    let position = assert_ok!(h.service.earn_position(coll(1), &owner()).await);
    assert!(position.is_none());
    assert_eq!(h.mock.call_count(), 1);
}

#[tokio::test]
async fn test_earn_position_rejects_malformed_depositor() {
    let h = harness(
        MockDataSource::new()
            .with_deposit(coll(0), owner(), sp_deposit("not-an-address", 0))
            .with_yield_params(coll(0), quiet_params()),
    );

    match h.service.earn_position(coll(0), &owner()).await {
        Err(ServiceError::Validation(ValidationError::InvalidAddress { field, value })) => {
            assert_eq!(field, "depositor");
            assert_eq!(value, "not-an-address");
        }
        other => panic!("Expected InvalidAddress, got {:?}", other),
    }
}

#[tokio::test]
async fn test_trove_rejects_unknown_status_code() {
    let h = harness(MockDataSource::new().with_trove_status(
        coll(0),
        liquity_views::TroveId::from_str("0x2a").unwrap(),
        9,
    ));

    match h.service.trove("0:0x2a").await {
        Err(ServiceError::Validation(ValidationError::UnknownTroveStatus(9))) => {}
        other => panic!("Expected UnknownTroveStatus, got {:?}", other),
    }
}

#[test]
fn test_prefixed_trove_id_for_owner() {
    let h = harness(MockDataSource::new());
    let prefixed = h
        .service
        .prefixed_trove_id_for(&Address::ZERO, &BigUint::from(0u32), 1)
        .unwrap();
    assert_eq!(
        prefixed.to_string(),
        "1:0xad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
    );
    assert_eq!(
        h.service
            .prefixed_trove_id_for(&Address::ZERO, &BigUint::from(0u32), 3),
        Err(ValidationError::InvalidCollIndex(3))
    );
}
