//! Month-by-month weather comparison between two locations.
//!
//! Daily records are reduced to [`metrics::MonthlyMetrics`], each month is
//! scored head to head by [`scoring::score_month`], and the months are folded
//! into a [`aggregate::ComparisonResult`]. [`engine::ComparisonEngine`] ties
//! this to a history source and the [`cache::ComparisonCache`].

pub mod aggregate;
pub mod cache;
pub mod engine;
pub mod metrics;
pub mod scoring;
pub mod views;
pub mod visibility;

pub use aggregate::{aggregate, ComparisonResult};
pub use cache::{CacheKey, ComparisonCache};
pub use engine::{compare, CompareOptions, ComparisonContext, ComparisonEngine, ComparisonWindow};
pub use metrics::{Metric, MonthlyMetrics};
pub use scoring::{score_month, MonthResult, Side};
pub use visibility::{ComparisonConfig, MetricSettings, MetricVisibility};
