#![forbid(unsafe_code)]

//! benchboard: the metrics core of a front-end benchmarking dashboard.
//!
//! Scenario runners (list rendering, image loading, data fetching) report one
//! [`MetricRecord`](metrics::record::MetricRecord) per run. The crate keeps
//! them in an append-only store and derives everything else on read:
//!
//! 1. **Aggregation**: mean, extremes, P95, success rate, moving averages and
//!    period-over-period deltas, grouped by category
//! 2. **Alerts**: duration and success-rate thresholds over each category's
//!    most recent runs
//! 3. **Insights**: recent-versus-prior comparisons and a slow-image rule
//!
//! # Library usage
//!
//! ```rust,no_run
//! use benchboard::prelude::*;
//!
//! let mut store = MetricStore::new();
//! store.add_metric(MetricRecord::new(Category::Image, "Image 1", 120.0, true));
//! let alerts = AlertEvaluator::new(AlertThresholds::default()).evaluate(store.metrics());
//! ```

pub mod prelude;

pub mod analysis;
pub mod core;
pub mod logger;
pub mod metrics;
