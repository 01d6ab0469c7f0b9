//! Session-unique identifiers and the wall clock used for record timestamps.

use rand::random;

/// Identifier prefix for stored metric records.
pub const METRIC_PREFIX: &str = "m";
/// Identifier prefix for alerts.
pub const ALERT_PREFIX: &str = "a";
/// Identifier prefix for insights.
pub const INSIGHT_PREFIX: &str = "i";

/// Generate `"{prefix}-{32 hex chars}"` from a random 128-bit nonce.
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    let nonce = random::<u128>();
    format!("{prefix}-{nonce:032x}")
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format a millisecond timestamp as RFC 3339 UTC, or `"invalid"` when out of range.
#[must_use]
pub fn format_millis(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms).map_or_else(
        || "invalid".to_string(),
        |dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    )
}
