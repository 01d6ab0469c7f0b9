//! The atomic unit of recorded data: one benchmark run or timed operation.

#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::ids::{METRIC_PREFIX, generate_id, now_millis};

/// Open key/value payload attached to a record (method, cache hit, strategy, ...).
///
/// The schema varies by category and is never inspected by aggregation.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// Benchmark category. The three scenario families are named; anything else
/// is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Image,
    List,
    Data,
    Other(String),
}

impl Category {
    /// Parse a category label. Never fails: unknown labels become `Other`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "image" => Self::Image,
            "list" => Self::List,
            "data" => Self::Data,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::List => "list",
            Self::Data => "data",
            Self::Other(label) => label,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse(&label))
    }
}

/// One completed scenario run.
///
/// No field is validated: negative or non-finite durations are accepted and
/// flow through aggregation unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub id: String,
    pub category: Category,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Time taken, in milliseconds. Non-finite values are written as the
    /// strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
    #[serde(with = "lenient_f64")]
    pub duration: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Details::is_empty")]
    pub details: Details,
}

impl MetricRecord {
    /// Build a record stamped with a fresh id and the current time.
    pub fn new(
        category: impl Into<Category>,
        name: impl Into<String>,
        duration: f64,
        success: bool,
    ) -> Self {
        Self {
            id: generate_id(METRIC_PREFIX),
            category: category.into(),
            name: name.into(),
            timestamp: now_millis(),
            duration,
            success,
            details: Details::new(),
        }
    }

    /// Override the timestamp (ms since epoch).
    #[must_use]
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach one auxiliary detail.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

// ──────────────────── non-finite durations ────────────────────

/// JSON has no literal for `NaN` or `±inf`; serde_json would write all of
/// them as `null` and then refuse to read that back as an `f64`.
mod lenient_f64 {
    use std::fmt;

    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};

    const NAN: &str = "NaN";
    const INFINITY: &str = "Infinity";
    const NEG_INFINITY: &str = "-Infinity";

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN)
        } else if value.is_infinite() {
            serializer.serialize_str(if value.is_sign_positive() {
                INFINITY
            } else {
                NEG_INFINITY
            })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(LenientF64)
    }

    struct LenientF64;

    impl Visitor<'_> for LenientF64 {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"NaN\", \"Infinity\", \"-Infinity\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                NAN => Ok(f64::NAN),
                INFINITY => Ok(f64::INFINITY),
                NEG_INFINITY => Ok(f64::NEG_INFINITY),
                other => Err(E::invalid_value(Unexpected::Str(other), &self)),
            }
        }
    }
}
