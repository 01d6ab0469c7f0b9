//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use benchboard::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{BenchError, Result};

// Metrics
pub use crate::metrics::aggregate::{TrendPoint, average, percentile95, period_delta, success_rate};
pub use crate::metrics::ingest::{MetricIngest, MetricSender};
pub use crate::metrics::record::{Category, MetricRecord};
pub use crate::metrics::store::{
    CategoryPerformance, MetricStore, PerformanceResult, SharedMetricStore, StoreChange,
};

// Analysis
pub use crate::analysis::alerts::{Alert, AlertEvaluator, AlertFeed, AlertSeverity, AlertThresholds};
pub use crate::analysis::filter::{RecordFilter, TimeRange};
pub use crate::analysis::insights::{Impact, Insight, InsightEngine, InsightKind};
pub use crate::analysis::summary::{CategoryComparison, PerformanceSummary};
pub use crate::analysis::vitals::{CoreWebVital, VitalKind, VitalRating, rate_vital};

// Logging
pub use crate::logger::activity::ActivityLog;
