//! Shared activity log handle: domain events in, JSONL lines out.

#![allow(missing_docs)]

use std::sync::Arc;

use parking_lot::Mutex;

use crate::analysis::alerts::{Alert, AlertSeverity};
use crate::analysis::insights::{Impact, Insight};
use crate::core::config::Config;
use crate::core::errors::BenchError;
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use crate::metrics::store::{MetricStore, StoreChange, SubscriptionId};

/// Cloneable handle to one [`JsonlWriter`]. A disabled log accepts every
/// call and writes nothing.
#[derive(Clone, Default)]
pub struct ActivityLog {
    writer: Option<Arc<Mutex<JsonlWriter>>>,
}

impl ActivityLog {
    /// Open the log described by `config`, or a disabled log when logging
    /// is turned off.
    #[must_use]
    pub fn open(config: &Config) -> Self {
        if !config.logging.enabled {
            return Self::disabled();
        }
        Self::with_writer(JsonlWriter::open(JsonlConfig::from_config(config)))
    }

    #[must_use]
    pub fn with_writer(writer: JsonlWriter) -> Self {
        Self {
            writer: Some(Arc::new(Mutex::new(writer))),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Write one entry and flush it.
    pub fn record(&self, entry: &LogEntry) {
        if let Some(writer) = &self.writer {
            let mut w = writer.lock();
            w.write_entry(entry);
            w.flush();
        }
    }

    /// Log every future store mutation synchronously.
    pub fn attach(&self, store: &mut MetricStore) -> SubscriptionId {
        let log = self.clone();
        store.subscribe(move |change| log.record(&change_entry(change)))
    }

    pub fn alerts(&self, alerts: &[Alert]) {
        for alert in alerts {
            let severity = match alert.severity {
                AlertSeverity::Error => Severity::Error,
                AlertSeverity::Warning => Severity::Warning,
                AlertSeverity::Success => Severity::Info,
            };
            let mut entry = LogEntry::new(EventType::AlertRaised, severity);
            entry.category = Some(alert.category.to_string());
            entry.details = Some(alert.message.clone());
            self.record(&entry);
        }
    }

    pub fn insights(&self, insights: &[Insight]) {
        for insight in insights {
            let severity = if insight.impact == Impact::High {
                Severity::Warning
            } else {
                Severity::Info
            };
            let mut entry = LogEntry::new(EventType::InsightEmitted, severity);
            entry.details = Some(format!("{}: {}", insight.title, insight.description));
            self.record(&entry);
        }
    }

    /// Bulk transfer of `count` records (`ImportLoaded` / `ExportWritten`).
    pub fn transfer(&self, event: EventType, count: usize, source: &str) {
        let mut entry = LogEntry::new(event, Severity::Info);
        entry.count = Some(count);
        entry.details = Some(source.to_string());
        self.record(&entry);
    }

    pub fn error(&self, err: &BenchError) {
        self.record(&LogEntry::from_error(err));
    }
}

fn change_entry(change: &StoreChange<'_>) -> LogEntry {
    match change {
        StoreChange::Added(record) => {
            let mut entry = LogEntry::new(EventType::MetricRecorded, Severity::Info);
            entry.category = Some(record.category.to_string());
            entry.duration_ms = Some(record.duration);
            entry.ok = Some(record.success);
            entry.details = Some(record.name.clone());
            entry
        }
        StoreChange::Cleared { removed } => {
            let mut entry = LogEntry::new(EventType::MetricsCleared, Severity::Info);
            entry.count = Some(*removed);
            entry
        }
    }
}
