//! Whole-run summary, per-category comparison, and per-category trend series.

#![allow(missing_docs)]

use serde::Serialize;

use crate::metrics::aggregate::{
    DEFAULT_PERIOD_SIZE, TrendPoint, average, durations, percentile95, period_difference,
    success_rate, trend_points,
};
use crate::metrics::record::{Category, MetricRecord};

/// Headline numbers across every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    pub total_tests: usize,
    pub success_rate: f64,
    pub avg_duration: f64,
    /// Mean of the recent period minus the mean of the one before it (ms).
    /// Non-finite when fewer than two periods have data; serialized as `null`.
    pub trend_ms: f64,
    pub p95: f64,
}

impl PerformanceSummary {
    pub fn compute(records: &[MetricRecord]) -> Self {
        Self::compute_with(records, DEFAULT_PERIOD_SIZE)
    }

    pub fn compute_with(records: &[MetricRecord], period_size: usize) -> Self {
        Self {
            total_tests: records.len(),
            success_rate: success_rate(records),
            avg_duration: average(records),
            trend_ms: period_difference(records, period_size),
            p95: percentile95(&durations(records)),
        }
    }

    /// `trend_ms` when it is a real number.
    #[must_use]
    pub fn trend(&self) -> Option<f64> {
        self.trend_ms.is_finite().then_some(self.trend_ms)
    }
}

/// Side-by-side numbers for one selected category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryComparison {
    pub category: Category,
    pub avg_duration: f64,
    pub success_rate: f64,
    pub p95: f64,
    pub total_runs: usize,
}

impl CategoryComparison {
    /// One row per requested category, request order. Categories with no
    /// records produce a zero row.
    pub fn compute(records: &[MetricRecord], categories: &[Category]) -> Vec<Self> {
        categories
            .iter()
            .map(|category| {
                let group: Vec<&MetricRecord> =
                    records.iter().filter(|r| &r.category == category).collect();
                Self {
                    category: category.clone(),
                    avg_duration: average(&group),
                    success_rate: success_rate(&group),
                    p95: percentile95(&durations(&group)),
                    total_runs: group.len(),
                }
            })
            .collect()
    }
}

/// Trend series for one category in insertion order.
pub fn category_trend(
    records: &[MetricRecord],
    category: &Category,
    window_size: usize,
) -> Vec<TrendPoint> {
    let group: Vec<&MetricRecord> = records.iter().filter(|r| &r.category == category).collect();
    trend_points(&group, window_size)
}
