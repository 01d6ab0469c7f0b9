//! Multi-producer ingest queue with a single writer.
//!
//! Scenario runners on any thread hold a cheap [`MetricSender`] and push
//! completed runs into a bounded crossbeam channel. Exactly one owner of the
//! [`MetricStore`] drains the queue with [`MetricIngest::drain_into`], so the
//! store keeps one writer path and records land in arrival order.

#![allow(missing_docs)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};

use crate::core::errors::{BenchError, Result};
use crate::metrics::record::MetricRecord;
use crate::metrics::store::MetricStore;

/// Default bounded channel capacity.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Create a bounded ingest queue.
pub fn channel(capacity: usize) -> (MetricSender, MetricIngest) {
    let (tx, rx) = bounded::<MetricRecord>(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        MetricSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        MetricIngest { rx, dropped },
    )
}

/// Thread-safe, cheaply-cloneable producer handle.
#[derive(Clone)]
pub struct MetricSender {
    tx: Sender<MetricRecord>,
    dropped: Arc<AtomicU64>,
}

impl MetricSender {
    /// Queue a record. Non-blocking: when the queue is full the record is
    /// dropped and counted.
    ///
    /// Returns `ChannelClosed` once the writer side has gone away.
    pub fn send(&self, record: MetricRecord) -> Result<()> {
        match self.tx.try_send(record) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(BenchError::ChannelClosed { component: "ingest" })
            }
        }
    }

    /// Records dropped due to back-pressure.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Single consumer side of the ingest queue.
pub struct MetricIngest {
    rx: Receiver<MetricRecord>,
    dropped: Arc<AtomicU64>,
}

impl MetricIngest {
    /// Move every queued record into the store, arrival order. Returns the
    /// number appended. Observers fire once per record.
    pub fn drain_into(&self, store: &mut MetricStore) -> usize {
        let mut appended = 0;
        loop {
            match self.rx.try_recv() {
                Ok(record) => {
                    store.add_metric(record);
                    appended += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        appended
    }

    /// Records waiting to be drained.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Records dropped by producers due to back-pressure.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
