//! Core web-vital rating for externally supplied FCP / LCP / CLS samples.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::errors::BenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VitalKind {
    #[serde(rename = "FCP")]
    FirstContentfulPaint,
    #[serde(rename = "LCP")]
    LargestContentfulPaint,
    #[serde(rename = "CLS")]
    CumulativeLayoutShift,
}

impl VitalKind {
    /// `(good_below, needs_improvement_below)`.
    #[must_use]
    pub const fn bounds(self) -> (f64, f64) {
        match self {
            Self::FirstContentfulPaint => (1800.0, 3000.0),
            Self::LargestContentfulPaint => (2500.0, 4000.0),
            Self::CumulativeLayoutShift => (0.1, 0.25),
        }
    }

    #[must_use]
    pub const fn target(self) -> f64 {
        self.bounds().0
    }

    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::FirstContentfulPaint => "FCP",
            Self::LargestContentfulPaint => "LCP",
            Self::CumulativeLayoutShift => "CLS",
        }
    }
}

impl fmt::Display for VitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for VitalKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FCP" => Ok(Self::FirstContentfulPaint),
            "LCP" => Ok(Self::LargestContentfulPaint),
            "CLS" => Ok(Self::CumulativeLayoutShift),
            other => Err(BenchError::InvalidConfig {
                details: format!("unknown web vital {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VitalRating {
    Good,
    NeedsImprovement,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoreWebVital {
    pub name: VitalKind,
    pub value: f64,
    pub rating: VitalRating,
    pub target: f64,
}

/// Rate one sample. Bounds are exclusive: a value equal to the good bound
/// already needs improvement.
#[must_use]
pub fn rate_vital(kind: VitalKind, value: f64) -> CoreWebVital {
    let (good, needs_improvement) = kind.bounds();
    let rating = if value < good {
        VitalRating::Good
    } else if value < needs_improvement {
        VitalRating::NeedsImprovement
    } else {
        VitalRating::Poor
    };
    CoreWebVital {
        name: kind,
        value,
        rating,
        target: kind.target(),
    }
}
