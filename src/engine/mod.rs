//! Pure derivation over fully-resolved protocol data. No I/O.

pub mod interest_rate_chart;
pub mod positions;
pub mod stability_pool;

pub use interest_rate_chart::{build_interest_rate_chart, ChartPoint, RateGrid, MAX_GRID_STEPS};
pub use positions::{earn_position, earn_position_from_graph, stake_position_from_reads};
pub use stability_pool::{
    calculate_stability_pool_apr, coll_gain_from_snapshots, continuous_bold_gain,
    pending_sp_yield, ONE_YEAR_SECONDS, SCALE_FACTOR,
};
