//! Pure statistics over record sequences: mean, extremes, P95, success rate,
//! moving average, and period-over-period deltas.
//!
//! Every function takes a slice of anything that borrows as a
//! [`MetricRecord`], so callers can pass owned records or the `&MetricRecord`
//! views produced by category grouping. Nothing here touches the store.
//!
//! Empty inputs resolve to `0.0`, with one exception: the period deltas are
//! allowed to return a non-finite value when the baseline window is empty or
//! averages to zero. Display code must check `is_finite()` first.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::borrow::Borrow;
use std::collections::HashMap;

use serde::Serialize;

use crate::metrics::record::{Category, MetricRecord};

/// Default trailing window for [`moving_average`].
pub const DEFAULT_MOVING_WINDOW: usize = 5;

/// Default window size for [`period_delta`].
pub const DEFAULT_PERIOD_SIZE: usize = 10;

/// Mean duration; `0.0` for an empty input.
pub fn average<R: Borrow<MetricRecord>>(records: &[R]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    raw_mean(records)
}

/// Percentage of successful records; `0.0` for an empty input.
pub fn success_rate<R: Borrow<MetricRecord>>(records: &[R]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let ok = records.iter().filter(|r| (*r).borrow().success).count();
    100.0 * ok as f64 / records.len() as f64
}

/// Smallest duration; `0.0` for an empty input.
pub fn min_duration<R: Borrow<MetricRecord>>(records: &[R]) -> f64 {
    records
        .iter()
        .map(|r| r.borrow().duration)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

/// Largest duration; `0.0` for an empty input.
pub fn max_duration<R: Borrow<MetricRecord>>(records: &[R]) -> f64 {
    records
        .iter()
        .map(|r| r.borrow().duration)
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Durations in input order.
pub fn durations<R: Borrow<MetricRecord>>(records: &[R]) -> Vec<f64> {
    records.iter().map(|r| r.borrow().duration).collect()
}

/// 95th percentile by nearest rank: sort ascending, take index
/// `floor(0.95 * len)`. `0.0` for an empty input.
///
/// The input is not modified; a sorted copy is made.
pub fn percentile95(durations: &[f64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    let mut sorted = durations.to_vec();
    sorted.sort_by(f64::total_cmp);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (sorted.len() as f64 * 0.95).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Trailing moving average of duration, one value per input record.
///
/// Point `i` averages the inclusive range `[i - window_size, i]` (clamped at
/// zero), so a full window spans `window_size + 1` records.
pub fn moving_average<R: Borrow<MetricRecord>>(records: &[R], window_size: usize) -> Vec<f64> {
    (0..records.len())
        .map(|i| raw_mean(trailing_window(records, i, window_size)))
        .collect()
}

/// One point of a per-category trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub timestamp: i64,
    pub duration: f64,
    pub moving_avg: f64,
    pub success_rate: f64,
}

/// [`moving_average`] plus the success rate over the same trailing window.
pub fn trend_points<R: Borrow<MetricRecord>>(records: &[R], window_size: usize) -> Vec<TrendPoint> {
    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let rec = rec.borrow();
            let window = trailing_window(records, i, window_size);
            TrendPoint {
                timestamp: rec.timestamp,
                duration: rec.duration,
                moving_avg: raw_mean(window),
                success_rate: success_rate(window),
            }
        })
        .collect()
}

/// Split into `(recent, older)`: the last `size` records and the `size`
/// records immediately before them. Either side may be shorter or empty.
pub fn split_periods<R>(records: &[R], size: usize) -> (&[R], &[R]) {
    let len = records.len();
    let recent_start = len.saturating_sub(size);
    let older_start = len.saturating_sub(size.saturating_mul(2));
    (
        &records[recent_start..],
        &records[older_start..recent_start],
    )
}

/// Signed percent change of mean duration, recent period versus the one
/// before it: `(recent - older) / older * 100`.
///
/// Not guarded. `NaN` when the older period is empty, `±inf` when its mean
/// is zero and the recent mean is not.
pub fn period_delta<R: Borrow<MetricRecord>>(records: &[R], size: usize) -> f64 {
    let (recent, older) = split_periods(records, size);
    percent_change(raw_mean(recent), raw_mean(older))
}

/// Absolute change of mean duration in milliseconds, recent minus older.
///
/// `NaN` when either period is empty.
pub fn period_difference<R: Borrow<MetricRecord>>(records: &[R], size: usize) -> f64 {
    let (recent, older) = split_periods(records, size);
    raw_mean(recent) - raw_mean(older)
}

/// `(current - baseline) / baseline * 100` without any guard.
pub fn percent_change(current: f64, baseline: f64) -> f64 {
    (current - baseline) / baseline * 100.0
}

/// Partition records by category, categories in first-seen order and records
/// in insertion order within each group. Every record lands in exactly one group.
pub fn group_by_category(records: &[MetricRecord]) -> Vec<(&Category, Vec<&MetricRecord>)> {
    let mut index: HashMap<&Category, usize> = HashMap::new();
    let mut groups: Vec<(&Category, Vec<&MetricRecord>)> = Vec::new();
    for rec in records {
        let slot = *index.entry(&rec.category).or_insert_with(|| {
            groups.push((&rec.category, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(rec);
    }
    groups
}

// ──────────────────── helpers ────────────────────

/// Unguarded mean: `NaN` for an empty slice.
fn raw_mean<R: Borrow<MetricRecord>>(records: &[R]) -> f64 {
    let sum: f64 = records.iter().map(|r| r.borrow().duration).sum();
    sum / records.len() as f64
}

fn trailing_window<R>(records: &[R], index: usize, window_size: usize) -> &[R] {
    &records[index.saturating_sub(window_size)..=index]
}
