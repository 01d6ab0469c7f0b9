//! Record selection by category, age, and outcome.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::BenchError;
use crate::metrics::record::{Category, MetricRecord};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Maximum record age relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Hour,
    Day,
    Week,
    Month,
    #[default]
    All,
}

impl TimeRange {
    /// Window length in milliseconds. `None` for [`TimeRange::All`].
    #[must_use]
    pub const fn span_millis(self) -> Option<i64> {
        match self {
            Self::Hour => Some(HOUR_MS),
            Self::Day => Some(24 * HOUR_MS),
            Self::Week => Some(7 * 24 * HOUR_MS),
            Self::Month => Some(30 * 24 * HOUR_MS),
            Self::All => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(BenchError::InvalidConfig {
                details: format!("unknown time range {other:?} (expected hour|day|week|month|all)"),
            }),
        }
    }
}

/// Conjunction of optional criteria. The default filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// `None` keeps every category. An empty list keeps nothing.
    pub categories: Option<Vec<Category>>,
    pub time_range: TimeRange,
    pub success_only: bool,
}

impl RecordFilter {
    #[must_use]
    pub fn matches(&self, record: &MetricRecord, now_ms: i64) -> bool {
        if let Some(categories) = &self.categories
            && !categories.contains(&record.category)
        {
            return false;
        }
        if self.success_only && !record.success {
            return false;
        }
        match self.time_range.span_millis() {
            Some(span) => record.timestamp >= now_ms.saturating_sub(span),
            None => true,
        }
    }

    /// Matching records, insertion order.
    pub fn apply(&self, records: &[MetricRecord], now_ms: i64) -> Vec<MetricRecord> {
        records
            .iter()
            .filter(|r| self.matches(r, now_ms))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn rec(category: &str, age_ms: i64, success: bool) -> MetricRecord {
        MetricRecord::new(category, "run", 1.0, success).at(NOW - age_ms)
    }

    #[test]
    fn default_filter_keeps_everything() {
        let records = vec![rec("image", 0, true), rec("list", 90 * 24 * HOUR_MS, false)];
        assert_eq!(RecordFilter::default().apply(&records, NOW), records);
    }

    #[test]
    fn time_range_cuts_old_records() {
        let records = vec![
            rec("data", 10, true),
            rec("data", 2 * HOUR_MS, true),
            rec("data", 3 * 24 * HOUR_MS, true),
        ];
        let day = RecordFilter {
            time_range: TimeRange::Day,
            ..RecordFilter::default()
        };
        assert_eq!(day.apply(&records, NOW).len(), 2);

        let hour = RecordFilter {
            time_range: TimeRange::Hour,
            ..RecordFilter::default()
        };
        assert_eq!(hour.apply(&records, NOW).len(), 1);
    }

    #[test]
    fn category_and_success_combine() {
        let records = vec![
            rec("image", 0, true),
            rec("image", 0, false),
            rec("list", 0, true),
            rec("data", 0, true),
        ];
        let filter = RecordFilter {
            categories: Some(vec![Category::Image, Category::Data]),
            success_only: true,
            ..RecordFilter::default()
        };
        let kept = filter.apply(&records, NOW);
        let cats: Vec<&str> = kept.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(cats, ["image", "data"]);
    }

    #[test]
    fn empty_category_list_keeps_nothing() {
        let filter = RecordFilter {
            categories: Some(Vec::new()),
            ..RecordFilter::default()
        };
        assert!(filter.apply(&[rec("image", 0, true)], NOW).is_empty());
    }

    #[test]
    fn time_range_parses_case_insensitively() {
        assert_eq!("Week".parse::<TimeRange>().unwrap(), TimeRange::Week);
        let err = "fortnight".parse::<TimeRange>().unwrap_err();
        assert_eq!(err.code(), "BB-1001");
    }
}
