//! JSON export/import of the raw record sequence.
//!
//! The export document is `{ "exported_at", "count", "metrics": [...] }`.
//! Import also accepts a bare array of records, which is what most scenario
//! runners dump.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{BenchError, Result};
use crate::metrics::record::MetricRecord;

/// Export envelope around the raw records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportDocument {
    /// RFC 3339 UTC time of the export.
    pub exported_at: String,
    /// Number of records, equal to `metrics.len()`.
    pub count: usize,
    /// Records in insertion order.
    pub metrics: Vec<MetricRecord>,
}

impl ExportDocument {
    /// Wrap records, stamped with the current time.
    pub fn new(metrics: &[MetricRecord]) -> Self {
        Self {
            exported_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            count: metrics.len(),
            metrics: metrics.to_vec(),
        }
    }
}

/// Serialize records as a pretty-printed export document.
pub fn to_json(metrics: &[MetricRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportDocument::new(metrics))?)
}

/// Parse an export document or a bare record array.
///
/// The shape is picked from the top-level JSON value first, so a bad record
/// reports the real serde error (missing field, wrong type) in the
/// `InvalidImport` details.
pub fn from_json(raw: &str) -> Result<Vec<MetricRecord>> {
    let value: Value = serde_json::from_str(raw).map_err(invalid_import)?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(invalid_import),
        Value::Object(_) => {
            let doc: ExportDocument = serde_json::from_value(value).map_err(invalid_import)?;
            if doc.count != doc.metrics.len() {
                return Err(BenchError::InvalidImport {
                    details: format!(
                        "count field says {} but document holds {} records",
                        doc.count,
                        doc.metrics.len()
                    ),
                });
            }
            Ok(doc.metrics)
        }
        other => Err(BenchError::InvalidImport {
            details: format!(
                "expected an export document or an array of records, found {}",
                json_kind(&other)
            ),
        }),
    }
}

fn invalid_import(err: serde_json::Error) -> BenchError {
    BenchError::InvalidImport {
        details: err.to_string(),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Write an export document to `path`, creating parent directories.
pub fn write_file(path: &Path, metrics: &[MetricRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| BenchError::io(parent, source))?;
    }
    let json = to_json(metrics)?;
    fs::write(path, json).map_err(|source| BenchError::io(path, source))
}

/// Read records from an export document or bare array at `path`.
pub fn read_file(path: &Path) -> Result<Vec<MetricRecord>> {
    let raw = fs::read_to_string(path).map_err(|source| BenchError::io(path, source))?;
    from_json(&raw)
}
