//! Threshold alerts over the most recent records of each category.

#![allow(missing_docs)]

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

use crate::core::config::AlertConfig;
use crate::core::ids::{ALERT_PREFIX, generate_id, now_millis};
use crate::metrics::aggregate::{average, group_by_category, success_rate};
use crate::metrics::record::{Category, MetricRecord};

/// Records per category inspected by one evaluation pass.
pub const DEFAULT_WINDOW: usize = 10;

/// Alerts kept by an [`AlertFeed`] unless told otherwise.
pub const DEFAULT_RETAINED: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Error,
    Success,
}

impl AlertSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threshold violation noticed during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    pub severity: AlertSeverity,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub category: Category,
}

impl Alert {
    fn raise(severity: AlertSeverity, category: &Category, message: String) -> Self {
        Self {
            id: generate_id(ALERT_PREFIX),
            severity,
            message,
            timestamp: now_millis(),
            category: category.clone(),
        }
    }
}

/// Upper bound on mean duration (ms) and lower bound on success rate (%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub duration: f64,
    pub success_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            success_rate: 95.0,
        }
    }
}

/// Stateless rule evaluation. Each call looks only at the records it is given.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
    window: usize,
}

impl AlertEvaluator {
    #[must_use]
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            thresholds,
            window: DEFAULT_WINDOW,
        }
    }

    #[must_use]
    pub fn from_config(config: &AlertConfig) -> Self {
        Self {
            thresholds: AlertThresholds {
                duration: config.duration_threshold_ms,
                success_rate: config.success_rate_threshold,
            },
            window: config.window,
        }
    }

    #[must_use]
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn thresholds(&self) -> AlertThresholds {
        self.thresholds
    }

    /// Evaluate every category, first-seen order. Within one category a
    /// duration warning precedes a success-rate error.
    pub fn evaluate(&self, records: &[MetricRecord]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        for (category, group) in group_by_category(records) {
            let recent = &group[group.len().saturating_sub(self.window)..];
            if recent.is_empty() {
                continue;
            }

            let avg = average(recent);
            if avg > self.thresholds.duration {
                alerts.push(Alert::raise(
                    AlertSeverity::Warning,
                    category,
                    format!("High average duration ({avg:.2}ms) detected in {category}"),
                ));
            }

            let rate = success_rate(recent);
            if rate < self.thresholds.success_rate {
                alerts.push(Alert::raise(
                    AlertSeverity::Error,
                    category,
                    format!("Low success rate ({rate:.1}%) detected in {category}"),
                ));
            }
        }
        alerts
    }
}

/// Bounded display feed: newest alerts kept, oldest dropped first.
#[derive(Debug, Clone)]
pub struct AlertFeed {
    capacity: usize,
    alerts: VecDeque<Alert>,
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(DEFAULT_RETAINED)
    }
}

impl AlertFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            alerts: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        if self.capacity == 0 {
            return;
        }
        while self.alerts.len() >= self.capacity {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }

    pub fn extend(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            self.push(alert);
        }
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }
}
