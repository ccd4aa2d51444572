// Reports module - valuation, allocation and portfolio tools

pub mod filters;
pub mod performance;
pub mod portfolio;
pub mod rebalance;

pub use filters::{group_by_category, HoldingFilter, PerformanceFilter};
pub use performance::{
    comparison_series, performance_series, Benchmark, ComparisonPoint, PerformancePoint, TimeRange,
};
pub use portfolio::{
    aggregate, allocation_breakdown, value_positions, AggregateSnapshot, AllocationSlice,
    Performer, PositionValuation,
};
pub use rebalance::{suggest_rebalance, RebalanceAction, TradeSide};
