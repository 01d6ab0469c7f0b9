//! Qualitative insights: recent period versus the period before it, plus a
//! fixed rule for slow image loading.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::config::InsightConfig;
use crate::core::ids::{INSIGHT_PREFIX, generate_id};
use crate::metrics::aggregate::{average, group_by_category, period_delta, split_periods};
use crate::metrics::record::{Category, MetricRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Improvement,
    Degradation,
    Suggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub impact: Impact,
}

impl Insight {
    fn new(kind: InsightKind, title: String, description: String, impact: Impact) -> Self {
        Self {
            id: generate_id(INSIGHT_PREFIX),
            kind,
            title,
            description,
            impact,
        }
    }
}

/// Generates insights from the full record sequence.
#[derive(Debug, Clone)]
pub struct InsightEngine {
    config: InsightConfig,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(InsightConfig::default())
    }
}

impl InsightEngine {
    #[must_use]
    pub fn new(config: InsightConfig) -> Self {
        Self { config }
    }

    /// One pass over every category, first-seen order.
    ///
    /// A category with fewer than two full windows may still yield a trend
    /// insight as long as the prior window is non-empty with a non-zero mean.
    /// A non-finite change never yields one.
    pub fn generate(&self, records: &[MetricRecord]) -> Vec<Insight> {
        let mut insights = Vec::new();
        for (category, group) in group_by_category(records) {
            let change = period_delta(&group, self.config.window);
            if let Some(insight) = self.trend_insight(category, change) {
                insights.push(insight);
            }

            let (recent, _) = split_periods(&group, self.config.window);
            if *category == Category::Image
                && !recent.is_empty()
                && average(recent) > self.config.image_slow_ms
            {
                insights.push(Insight::new(
                    InsightKind::Suggestion,
                    "Image Optimization Needed".to_string(),
                    "Consider implementing lazy loading or optimizing image sizes".to_string(),
                    Impact::Medium,
                ));
            }
        }
        insights
    }

    fn trend_insight(&self, category: &Category, change: f64) -> Option<Insight> {
        // Empty or zero baseline.
        if !change.is_finite() || change.abs() <= self.config.change_pct {
            return None;
        }
        let degraded = change > 0.0;
        let (kind, label, direction) = if degraded {
            (InsightKind::Degradation, "Degradation", "slower")
        } else {
            (InsightKind::Improvement, "Improvement", "faster")
        };
        let impact = if change.abs() > self.config.high_impact_pct {
            Impact::High
        } else {
            Impact::Medium
        };
        Some(Insight::new(
            kind,
            format!("{category} Performance {label}"),
            format!("{:.1}% {direction} than previous period", change.abs()),
            impact,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(category: &str, durations: &[f64]) -> Vec<MetricRecord> {
        durations
            .iter()
            .map(|&d| MetricRecord::new(category, "run", d, true))
            .collect()
    }

    fn repeat(category: &str, older: f64, recent: f64) -> Vec<MetricRecord> {
        let mut records = series(category, &[older; 10]);
        records.extend(series(category, &[recent; 10]));
        records
    }

    #[test]
    fn slow_images_get_degradation_and_suggestion() {
        let insights = InsightEngine::default().generate(&repeat("image", 800.0, 1200.0));
        assert_eq!(insights.len(), 2);

        assert_eq!(insights[0].kind, InsightKind::Degradation);
        assert_eq!(insights[0].impact, Impact::High);
        assert_eq!(insights[0].title, "image Performance Degradation");
        assert_eq!(insights[0].description, "50.0% slower than previous period");

        assert_eq!(insights[1].kind, InsightKind::Suggestion);
        assert_eq!(insights[1].title, "Image Optimization Needed");
        assert_eq!(insights[1].impact, Impact::Medium);
    }

    #[test]
    fn moderate_improvement_is_medium_impact() {
        let insights = InsightEngine::default().generate(&repeat("list", 100.0, 85.0));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Improvement);
        assert_eq!(insights[0].impact, Impact::Medium);
        assert_eq!(insights[0].description, "15.0% faster than previous period");
    }

    #[test]
    fn small_change_is_silent() {
        assert!(InsightEngine::default()
            .generate(&repeat("data", 100.0, 105.0))
            .is_empty());
    }

    #[test]
    fn exactly_ten_percent_is_silent() {
        assert!(InsightEngine::default()
            .generate(&repeat("data", 100.0, 110.0))
            .is_empty());
    }

    #[test]
    fn single_window_yields_no_trend_insight() {
        let records = series("list", &[50.0; 7]);
        assert!(period_delta(&records, 10).is_nan());
        assert!(InsightEngine::default().generate(&records).is_empty());
    }

    #[test]
    fn zero_baseline_yields_no_trend_insight() {
        let records = repeat("data", 0.0, 40.0);
        assert!(period_delta(&records, 10).is_infinite());
        assert!(InsightEngine::default().generate(&records).is_empty());
    }

    #[test]
    fn suggestion_needs_slow_recent_images_only() {
        let insights = InsightEngine::default().generate(&repeat("image", 1500.0, 1500.0));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Suggestion);

        let fast = InsightEngine::default().generate(&repeat("image", 1500.0, 1490.0));
        assert_eq!(fast.len(), 1);

        assert!(InsightEngine::default()
            .generate(&repeat("list", 1500.0, 1500.0))
            .is_empty());
    }

    #[test]
    fn short_prior_window_still_compares() {
        let mut records = series("list", &[100.0; 3]);
        records.extend(series("list", &[200.0; 10]));
        let insights = InsightEngine::default().generate(&records);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Degradation);
    }

    #[test]
    fn config_thresholds_apply() {
        let engine = InsightEngine::new(InsightConfig {
            window: 2,
            change_pct: 1.0,
            high_impact_pct: 2.0,
            image_slow_ms: 1000.0,
        });
        let records = series("data", &[100.0, 100.0, 103.0, 103.0]);
        let insights = engine.generate(&records);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].impact, Impact::High);
    }

    #[test]
    fn insight_serializes_kind_as_type() {
        let insights = InsightEngine::default().generate(&repeat("list", 100.0, 200.0));
        let json = serde_json::to_value(&insights[0]).unwrap();
        assert_eq!(json["type"], "degradation");
        assert_eq!(json["impact"], "high");
    }
}
