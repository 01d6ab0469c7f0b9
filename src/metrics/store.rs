//! Append-only metric store: the single source of truth for recorded runs.
//!
//! The store is constructed explicitly and passed by reference to every
//! consumer. Mutations (`add_metric`, `clear_metrics`) notify registered
//! observers synchronously, in registration order, before returning, so
//! every consumer sees the new state within the same call.
//!
//! Queries are recomputed from the raw records on every call; nothing
//! derived is cached, so a read can never observe stale aggregates.

#![allow(missing_docs)]

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::metrics::aggregate::{self, group_by_category};
use crate::metrics::record::{Category, MetricRecord};

// ──────────────────── derived views ────────────────────

/// Aggregate view of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResult {
    pub average_time: f64,
    pub min_time: f64,
    pub max_time: f64,
    pub success_rate: f64,
    pub total_runs: usize,
    pub metrics: Vec<MetricRecord>,
}

impl PerformanceResult {
    /// Build the view from one category's records.
    pub fn from_records(records: Vec<MetricRecord>) -> Self {
        Self {
            average_time: aggregate::average(&records),
            min_time: aggregate::min_duration(&records),
            max_time: aggregate::max_duration(&records),
            success_rate: aggregate::success_rate(&records),
            total_runs: records.len(),
            metrics: records,
        }
    }
}

/// Per-category summary row, one per distinct category in the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub category: Category,
    pub average_time: f64,
    pub success_rate: f64,
    pub metrics: Vec<MetricRecord>,
}

// ──────────────────── observers ────────────────────

/// What changed in the store.
#[derive(Debug, Clone, Copy)]
pub enum StoreChange<'a> {
    /// A record was appended; it is now the last record.
    Added(&'a MetricRecord),
    /// The store was emptied; `removed` records were dropped.
    Cleared { removed: usize },
}

/// Callback invoked after every mutation.
pub type Observer = Box<dyn FnMut(&StoreChange<'_>) + Send>;

/// Handle returned by [`MetricStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// ──────────────────── store ────────────────────

/// Ordered, append-only collection of [`MetricRecord`]s.
#[derive(Default)]
pub struct MetricStore {
    metrics: Vec<MetricRecord>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricStore")
            .field("metrics", &self.metrics.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl MetricStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with records, in the given order. No
    /// observers exist yet, so nothing is notified.
    #[must_use]
    pub fn from_records(metrics: Vec<MetricRecord>) -> Self {
        Self {
            metrics,
            ..Self::default()
        }
    }

    /// Append a record. Accepted as-is: no field is validated.
    pub fn add_metric(&mut self, record: MetricRecord) {
        self.metrics.push(record);
        if let Some(added) = self.metrics.last() {
            notify(&mut self.observers, &StoreChange::Added(added));
        }
    }

    /// Drop every record.
    pub fn clear_metrics(&mut self) {
        let removed = self.metrics.len();
        self.metrics.clear();
        notify(&mut self.observers, &StoreChange::Cleared { removed });
    }

    /// Register a callback for future mutations.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreChange<'_>) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` when the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    /// All records in insertion order.
    pub fn metrics(&self) -> &[MetricRecord] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// The last `n` records (fewer if the store is smaller), oldest first.
    pub fn recent(&self, n: usize) -> &[MetricRecord] {
        &self.metrics[self.metrics.len().saturating_sub(n)..]
    }

    /// Distinct categories currently present, first-seen order.
    pub fn categories(&self) -> Vec<Category> {
        group_by_category(&self.metrics)
            .into_iter()
            .map(|(category, _)| category.clone())
            .collect()
    }

    /// Records of one category, insertion order.
    pub fn category_records(&self, category: &Category) -> Vec<&MetricRecord> {
        self.metrics
            .iter()
            .filter(|m| &m.category == category)
            .collect()
    }

    /// One summary row per distinct category, first-seen order.
    pub fn get_all_categories(&self) -> Vec<CategoryPerformance> {
        group_by_category(&self.metrics)
            .into_iter()
            .map(|(category, records)| CategoryPerformance {
                category: category.clone(),
                average_time: aggregate::average(&records),
                success_rate: aggregate::success_rate(&records),
                metrics: records.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// Aggregate view of one category. An unknown category yields a
    /// zero-valued result.
    pub fn get_results_by_category(&self, category: &Category) -> PerformanceResult {
        let records = self
            .category_records(category)
            .into_iter()
            .cloned()
            .collect();
        PerformanceResult::from_records(records)
    }
}

fn notify(observers: &mut [(SubscriptionId, Observer)], change: &StoreChange<'_>) {
    for (_, observer) in observers.iter_mut() {
        observer(change);
    }
}

// ──────────────────── shared handle ────────────────────

/// Cloneable handle for a store shared across threads. Every mutation holds
/// the lock for its full duration, so appends from several producers are
/// serialized and insertion order stays well defined.
#[derive(Clone, Default)]
pub struct SharedMetricStore {
    inner: Arc<Mutex<MetricStore>>,
}

impl SharedMetricStore {
    #[must_use]
    pub fn new(store: MetricStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn add_metric(&self, record: MetricRecord) {
        self.inner.lock().add_metric(record);
    }

    pub fn clear_metrics(&self) {
        self.inner.lock().clear_metrics();
    }

    /// Run a read-only query against a consistent snapshot.
    pub fn read<T>(&self, query: impl FnOnce(&MetricStore) -> T) -> T {
        let guard = self.inner.lock();
        query(&*guard)
    }

    /// Run a mutation (e.g. subscribe) under the lock.
    pub fn write<T>(&self, op: impl FnOnce(&mut MetricStore) -> T) -> T {
        let mut guard = self.inner.lock();
        op(&mut *guard)
    }

    /// Owned copy of all records, insertion order.
    pub fn snapshot(&self) -> Vec<MetricRecord> {
        self.read(|store| store.metrics().to_vec())
    }
}

impl fmt::Debug for SharedMetricStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMetricStore")
            .field("metrics", &self.inner.lock().len())
            .finish()
    }
}
