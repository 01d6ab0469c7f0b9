//! Property-based tests for store and aggregation invariants: category
//! partition, P95 bounds and monotonicity, idempotent reads, and
//! clear-then-add equivalence with a fresh store.

use std::collections::HashSet;

use proptest::prelude::*;

use super::aggregate::{
    average, group_by_category, moving_average, percentile95, split_periods, success_rate,
};
use super::record::{Category, MetricRecord};
use super::store::MetricStore;

// ──────────────────── strategies ────────────────────

fn arb_category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Image),
        Just(Category::List),
        Just(Category::Data),
        "[a-z]{1,6}".prop_map(|s| Category::parse(&s)),
    ]
}

fn arb_record() -> impl Strategy<Value = MetricRecord> {
    (arb_category(), 0.0f64..10_000.0, any::<bool>(), 0i64..2_000_000_000_000).prop_map(
        |(category, duration, success, ts)| {
            MetricRecord::new(category, "run", duration, success).at(ts)
        },
    )
}

fn arb_records(max: usize) -> impl Strategy<Value = Vec<MetricRecord>> {
    prop::collection::vec(arb_record(), 0..max)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every record lands in exactly one group, in insertion order.
    #[test]
    fn grouping_partitions_records(records in arb_records(60)) {
        let groups = group_by_category(&records);
        let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
        prop_assert_eq!(total, records.len());

        for (category, group) in &groups {
            prop_assert!(group.iter().all(|r| &r.category == *category));
            let expected: Vec<&str> = records
                .iter()
                .filter(|r| &r.category == *category)
                .map(|r| r.id.as_str())
                .collect();
            let actual: Vec<&str> = group.iter().map(|r| r.id.as_str()).collect();
            prop_assert_eq!(actual, expected);
        }

        let distinct: HashSet<&Category> = groups.iter().map(|(c, _)| *c).collect();
        prop_assert_eq!(distinct.len(), groups.len());
    }

    /// Per-category totals from the store add up to the store size.
    #[test]
    fn category_results_cover_store(records in arb_records(60)) {
        let store = MetricStore::from_records(records.clone());
        let total: usize = store
            .categories()
            .iter()
            .map(|c| store.get_results_by_category(c).total_runs)
            .sum();
        prop_assert_eq!(total, records.len());
    }

    /// P95 is one of the inputs and bounded by min and max.
    #[test]
    fn p95_is_bounded(durations in prop::collection::vec(0.0f64..1e6, 1..100)) {
        let p = percentile95(&durations);
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(p >= min && p <= max);
        prop_assert!(durations.contains(&p));
    }

    /// Raising every duration never lowers the P95.
    #[test]
    fn p95_is_monotonic(
        durations in prop::collection::vec(0.0f64..1e6, 1..100),
        bump in 0.0f64..1e3,
    ) {
        let raised: Vec<f64> = durations.iter().map(|d| d + bump).collect();
        prop_assert!(percentile95(&raised) >= percentile95(&durations));
    }

    /// Success rate stays in [0, 100]; mean sits between the extremes.
    #[test]
    fn rates_and_means_are_bounded(records in arb_records(60)) {
        let rate = success_rate(&records);
        prop_assert!((0.0..=100.0).contains(&rate));
        if !records.is_empty() {
            let avg = average(&records);
            let min = records.iter().map(|r| r.duration).fold(f64::INFINITY, f64::min);
            let max = records.iter().map(|r| r.duration).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(avg >= min - 1e-6 && avg <= max + 1e-6);
        }
    }

    /// One moving-average point per record; window 0 echoes durations.
    #[test]
    fn moving_average_shape(records in arb_records(40), window in 0usize..8) {
        let points = moving_average(&records, window);
        prop_assert_eq!(points.len(), records.len());
        if window == 0 {
            for (p, r) in points.iter().zip(&records) {
                prop_assert!(close(*p, r.duration));
            }
        }
    }

    /// Recent and older periods never overlap and never exceed `size`.
    #[test]
    fn periods_are_disjoint(records in arb_records(50), size in 0usize..15) {
        let (recent, older) = split_periods(&records, size);
        prop_assert!(recent.len() <= size && older.len() <= size);
        prop_assert!(recent.len() + older.len() <= records.len());
        if let (Some(last_older), Some(first_recent)) = (older.last(), recent.first()) {
            let li = records.iter().position(|r| r.id == last_older.id);
            let fi = records.iter().position(|r| r.id == first_recent.id);
            prop_assert!(li < fi);
        }
    }

    /// Appending a value above the current maximum never lowers the P95.
    #[test]
    fn p95_survives_appending_a_new_maximum(
        durations in prop::collection::vec(0.0f64..1e6, 1..200),
        delta in 1e-3f64..1e3,
    ) {
        let before = percentile95(&durations);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut extended = durations.clone();
        extended.push(max + delta);
        prop_assert!(percentile95(&extended) >= before);
    }

    /// Reads do not change what later reads return.
    #[test]
    fn reads_are_idempotent(records in arb_records(40)) {
        let store = MetricStore::from_records(records);
        let first = store.get_all_categories();
        let again = store.get_all_categories();
        prop_assert_eq!(&first, &again);

        for category in store.categories() {
            let a = store.get_results_by_category(&category);
            let b = store.get_results_by_category(&category);
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(store.get_all_categories(), first);
        prop_assert_eq!(store.recent(5), store.recent(5));
    }

    /// Clearing then adding behaves like adding to a fresh store.
    #[test]
    fn clear_then_add_matches_fresh(before in arb_records(30), after in arb_records(30)) {
        let mut reused = MetricStore::new();
        for r in before {
            reused.add_metric(r);
        }
        reused.clear_metrics();
        let mut fresh = MetricStore::new();
        for r in after {
            reused.add_metric(r.clone());
            fresh.add_metric(r);
        }
        prop_assert_eq!(reused.metrics(), fresh.metrics());
        prop_assert_eq!(reused.categories(), fresh.categories());
    }
}
