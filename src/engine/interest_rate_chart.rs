//! Debt distribution across the interest rate grid.

use crate::domain::{Dnum, InterestRateBracket, Percent};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal as RustDecimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Grids with more points than this are rejected as misconfigured.
pub const MAX_GRID_STEPS: usize = 10_000;

/// Closed, evenly stepped range of selectable interest rates, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateGrid {
    min: Percent,
    max: Percent,
    increment: Percent,
}

impl RateGrid {
    /// `None` unless `increment > 0`, `min <= max`, the grid has at most
    /// `MAX_GRID_STEPS` points and every point is representable.
    pub fn new(min: Percent, max: Percent, increment: Percent) -> Option<Self> {
        if !increment.is_positive() || min > max {
            return None;
        }
        checked_steps(min.inner(), max.inner(), increment.inner())?;
        Some(Self {
            min,
            max,
            increment,
        })
    }

    pub fn min(&self) -> Percent {
        self.min
    }

    pub fn max(&self) -> Percent {
        self.max
    }

    pub fn increment(&self) -> Percent {
        self.increment
    }

    /// Number of grid points, both ends included.
    pub fn steps(&self) -> usize {
        checked_steps(self.min.inner(), self.max.inner(), self.increment.inner()).unwrap_or(0)
    }

    /// Rate of grid point `i`, truncated to one decimal so steps never drift.
    /// `None` past the last point.
    pub fn rate_at(&self, i: usize) -> Option<Percent> {
        if i >= self.steps() {
            return None;
        }
        grid_rate(self.min.inner(), self.increment.inner(), i).map(Percent::new)
    }

    /// Every grid rate, ascending.
    pub fn rates(&self) -> impl Iterator<Item = Percent> + '_ {
        (0..self.steps())
            .filter_map(move |i| grid_rate(self.min.inner(), self.increment.inner(), i))
            .map(Percent::new)
    }

    pub fn contains(&self, rate: Percent) -> bool {
        rate >= self.min && rate <= self.max
    }
}

fn grid_rate(min: RustDecimal, increment: RustDecimal, i: usize) -> Option<RustDecimal> {
    let ten = RustDecimal::TEN;
    let tenths = RustDecimal::from(i)
        .checked_mul(increment)?
        .checked_mul(ten)?
        .floor();
    min.checked_add(tenths.checked_div(ten)?)
}

fn checked_steps(min: RustDecimal, max: RustDecimal, increment: RustDecimal) -> Option<usize> {
    let intervals = max
        .checked_sub(min)?
        .checked_div(increment)?
        .round()
        .to_usize()?;
    let steps = intervals.checked_add(1)?;
    if steps > MAX_GRID_STEPS {
        return None;
    }
    // Offsets grow with the index, so the last point bounds them all.
    grid_rate(min, increment, intervals)?;
    Some(steps)
}

impl Default for RateGrid {
    fn default() -> Self {
        Self {
            min: Percent::new(RustDecimal::new(5, 1)),
            max: Percent::new(RustDecimal::new(25, 0)),
            increment: Percent::new(RustDecimal::new(1, 1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub rate: Percent,
    pub debt: Dnum,
    /// Debt at all lower rates, i.e. redeemed before this point.
    pub debt_in_front: Dnum,
    /// Bar height relative to the largest bracket, in [0, 1].
    pub size: f64,
}

/// One point per grid rate, ascending.
///
/// Brackets outside the grid are dropped; brackets at a rate between grid points
/// contribute to the totals but to no point.
pub fn build_interest_rate_chart(brackets: &[InterestRateBracket], grid: &RateGrid) -> Vec<ChartPoint> {
    let mut total_debt = Dnum::zero();
    let mut highest_debt = Dnum::zero();
    let mut debt_by_rate: BTreeMap<Percent, Dnum> = BTreeMap::new();

    for bracket in brackets {
        let Some(rate) = Percent::from_fraction(&bracket.rate) else {
            continue;
        };
        if !grid.contains(rate) {
            continue;
        }
        total_debt = &total_debt + &bracket.total_debt;
        let entry = debt_by_rate.entry(rate).or_default();
        *entry = &*entry + &bracket.total_debt;
        if *entry > highest_debt {
            highest_debt = entry.clone();
        }
    }

    let mut running_debt = Dnum::zero();
    grid.rates()
        .map(|rate| {
            let debt = debt_by_rate.get(&rate).cloned().unwrap_or_default();
            let debt_in_front = running_debt.clone();
            running_debt = &running_debt + &debt;
            let size = if total_debt.is_zero() {
                0.0
            } else {
                debt.checked_div(&highest_debt)
                    .map(|ratio| ratio.to_f64())
                    .unwrap_or(0.0)
            };
            ChartPoint {
                rate,
                debt,
                debt_in_front,
                size,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Dnum {
        Dnum::from_str(s).unwrap()
    }

    fn p(s: &str) -> Percent {
        Percent::from_str_canonical(s).unwrap()
    }

    fn bracket(rate: &str, debt: &str) -> InterestRateBracket {
        InterestRateBracket {
            rate: d(rate),
            total_debt: d(debt),
        }
    }

    #[test]
    fn test_two_step_grid() {
        let grid = RateGrid::new(p("5.0"), p("5.5"), p("0.5")).unwrap();
        let chart = build_interest_rate_chart(
            &[bracket("0.055", "50"), bracket("0.05", "100")],
            &grid,
        );

        assert_eq!(chart.len(), 2);
        assert_eq!(chart[0].rate, p("5.0"));
        assert_eq!(chart[1].rate, p("5.5"));
        assert_eq!(chart[0].debt, d("100"));
        assert_eq!(chart[1].debt, d("50"));
        assert_eq!(chart[0].debt_in_front, Dnum::zero());
        assert_eq!(chart[1].debt_in_front, d("100"));
        assert_eq!(chart[0].size, 1.0);
        assert_eq!(chart[1].size, 0.5);
    }

    #[test]
    fn test_default_grid_shape() {
        let grid = RateGrid::default();
        assert_eq!(grid.steps(), 246);
        assert_eq!(grid.rate_at(0), Some(p("0.5")));
        assert_eq!(grid.rate_at(1), Some(p("0.6")));
        assert_eq!(grid.rate_at(245), Some(p("25")));
        assert_eq!(grid.rate_at(246), None);
        assert_eq!(grid.rates().count(), 246);
    }

    #[test]
    fn test_out_of_range_brackets_ignored() {
        let grid = RateGrid::new(p("1"), p("2"), p("0.5")).unwrap();
        let chart = build_interest_rate_chart(
            &[bracket("0.005", "999"), bracket("0.015", "10"), bracket("0.3", "999")],
            &grid,
        );
        assert_eq!(chart.len(), 3);
        assert_eq!(chart[1].debt, d("10"));
        assert_eq!(chart[1].size, 1.0);
        assert_eq!(chart[2].debt_in_front, d("10"));
        assert_eq!(chart[0].size, 0.0);
    }

    #[test]
    fn test_empty_brackets_have_zero_size() {
        let grid = RateGrid::new(p("1"), p("2"), p("0.5")).unwrap();
        let chart = build_interest_rate_chart(&[], &grid);
        assert_eq!(chart.len(), 3);
        assert!(chart.iter().all(|c| c.size == 0.0 && c.debt.is_zero()));
    }

    #[test]
    fn test_duplicate_rates_are_summed() {
        let grid = RateGrid::new(p("5"), p("5"), p("0.1")).unwrap();
        let chart = build_interest_rate_chart(&[bracket("0.05", "1"), bracket("0.05", "2")], &grid);
        assert_eq!(chart.len(), 1);
        assert_eq!(chart[0].debt, d("3"));
        assert_eq!(chart[0].size, 1.0);
    }

    #[test]
    fn test_rates_ascending() {
        let grid = RateGrid::default();
        let chart = build_interest_rate_chart(&[bracket("0.07", "5")], &grid);
        assert!(chart.windows(2).all(|w| w[0].rate < w[1].rate));
    }

    #[test]
    fn test_invalid_grid() {
        assert!(RateGrid::new(p("1"), p("2"), p("0")).is_none());
        assert!(RateGrid::new(p("3"), p("2"), p("0.1")).is_none());
    }

    #[test]
    fn test_oversized_grid_rejected() {
        // One step too many.
        assert!(RateGrid::new(p("0"), p("1000"), p("0.1")).is_none());
        assert!(RateGrid::new(p("0"), p("999.9"), p("0.1")).is_some());

        // Spans that overflow the decimal must not panic.
        let huge = p("79228162514264337593543950335");
        let negative_huge = p("-79228162514264337593543950335");
        assert!(RateGrid::new(negative_huge, huge, p("0.0000000000000000000000000001")).is_none());
        assert!(RateGrid::new(p("0"), huge, huge).is_none());
        assert!(RateGrid::new(p("0"), huge, p("1")).is_none());
    }
}
