use liquity_views::domain::{
    CollateralCatalog, DepositSnapshot, Dnum, InterestRateBracket, Percent, PoolSum,
    SpYieldGainParams, StabilityPoolDeposit,
};
use liquity_views::engine::{
    build_interest_rate_chart, coll_gain_from_snapshots, continuous_bold_gain, earn_position,
    pending_sp_yield, RateGrid, ONE_YEAR_SECONDS, SCALE_FACTOR,
};
use std::str::FromStr;

fn d(s: &str) -> Dnum {
    Dnum::from_str(s).unwrap()
}

fn p(s: &str) -> Percent {
    Percent::from_str_canonical(s).unwrap()
}

fn sum(s: &str) -> PoolSum {
    PoolSum::from_str(s).unwrap()
}

fn deposit(amount: &str, p_snapshot: &str, s_snapshot: &str) -> StabilityPoolDeposit {
    StabilityPoolDeposit {
        depositor: "0x2222222222222222222222222222222222222222".to_string(),
        coll_index: 1,
        deposit: d(amount),
        snapshot: DepositSnapshot {
            epoch: 3,
            scale: 0,
            p: d(p_snapshot),
            s: sum(s_snapshot),
        },
    }
}

#[test]
fn test_gain_grows_with_pool_sum() {
    let mut previous = Dnum::zero();
    for s_now in ["2", "2.5", "4", "10.000000000000000000000000000000000001"] {
        let gain =
            coll_gain_from_snapshots(&d("10"), &d("1"), &sum("2"), &sum(s_now), &PoolSum::zero());
        assert!(gain >= previous, "gain shrank at S = {}", s_now);
        previous = gain;
    }
}

#[test]
fn test_next_scale_sum_is_discounted() {
    // The same increase counts SCALE_FACTOR times less when recorded one scale up.
    let same_scale =
        coll_gain_from_snapshots(&d("1"), &d("1"), &sum("0"), &sum("1"), &PoolSum::zero());
    let next_scale = coll_gain_from_snapshots(
        &d("1"),
        &d("1"),
        &sum("0"),
        &sum("0"),
        &PoolSum::from_int(SCALE_FACTOR as i64),
    );
    assert_eq!(same_scale, next_scale);
}

#[test]
fn test_small_sum_increments_survive_low_product() {
    // P near 1e-9 multiplies each 36-decimal step of S by 1e9, so sub-1e-18
    // increments still pay whole wei.
    let p_snapshot = Dnum::from_raw(1_000_000_000u64);
    let s_snapshot = PoolSum::from_raw(5u32);
    let s_now = PoolSum::from_raw(1_000_000_005u64);

    let gain =
        coll_gain_from_snapshots(&d("1"), &p_snapshot, &s_snapshot, &s_now, &PoolSum::zero());
    // 1e18 * 1e9 / (1e9 * 1e18) = 1 wei
    assert_eq!(gain, Dnum::from_raw(1u32));
}

#[test]
fn test_earn_position_from_raw_records() {
    let catalog = CollateralCatalog::default();
    let sp_deposit = deposit("100", "0.5", "1");
    let position = earn_position(&sp_deposit, &sum("1.25"), &PoolSum::zero(), d("3"), &catalog).unwrap();

    // 100 * 0.25 / 0.5
    assert_eq!(position.rewards.coll, d("50"));
    assert_eq!(position.rewards.bold, d("3"));
    assert_eq!(position.coll_index.as_usize(), 1);
    assert_eq!(position.deposit, d("100"));
}

#[test]
fn test_earn_position_rejects_unknown_branch() {
    let catalog = CollateralCatalog::default();
    let mut sp_deposit = deposit("1", "1", "0");
    sp_deposit.coll_index = 5;
    assert!(earn_position(&sp_deposit, &sum("1"), &PoolSum::zero(), Dnum::zero(), &catalog).is_err());
}

#[test]
fn test_yield_accrues_linearly_over_time() {
    let params = SpYieldGainParams {
        agg_weighted_debt_sum: d("365"),
        last_agg_update_time: 1_000,
        sp_yield_split: d("1"),
        total_bold_deposits: d("100"),
        yield_gains_pending: d("2"),
    };

    assert_eq!(pending_sp_yield(&params, 1_000), d("2"));
    // A clock behind the last update never produces negative yield.
    assert_eq!(pending_sp_yield(&params, 0), d("2"));
    assert_eq!(
        pending_sp_yield(&params, 1_000 + ONE_YEAR_SECONDS / 365),
        d("3")
    );

    let half_year = 1_000 + ONE_YEAR_SECONDS / 2;
    let gain = continuous_bold_gain(&params, &d("50"), &d("1"), half_year);
    // (182.5 + 2) * 50 / 100 + 1
    assert_eq!(gain, d("93.25"));
}

#[test]
fn test_chart_debt_in_front_is_running_total() {
    let grid = RateGrid::new(p("1"), p("3"), p("0.5")).unwrap();
    let brackets = vec![
        InterestRateBracket {
            rate: d("0.03"),
            total_debt: d("7"),
        },
        InterestRateBracket {
            rate: d("0.01"),
            total_debt: d("2"),
        },
        InterestRateBracket {
            rate: d("0.02"),
            total_debt: d("4"),
        },
    ];
    let chart = build_interest_rate_chart(&brackets, &grid);

    assert_eq!(chart.len(), 5);
    let mut expected_front = Dnum::zero();
    for point in &chart {
        assert_eq!(point.debt_in_front, expected_front);
        expected_front = &expected_front + &point.debt;
        assert!((0.0..=1.0).contains(&point.size));
    }
    assert_eq!(expected_front, d("13"));
    assert_eq!(chart[4].size, 1.0);
}
