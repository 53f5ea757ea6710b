//! Age policy.

use crate::models::cutoff;
use chrono::DateTime;

/// Returns `true` if `reference` is strictly older than `threshold_days`
/// before `now`.
///
/// All timestamps are Unix seconds. A threshold of 0 expires anything older
/// than `now`; a negative threshold moves the cutoff into the future.
#[must_use]
pub const fn is_expired(reference: i64, threshold_days: i64, now: i64) -> bool {
    reference < cutoff(now, threshold_days)
}

/// Formats a Unix timestamp as RFC 3339 for log output.
#[must_use]
pub fn format_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0).map_or_else(|| seconds.to_string(), |dt| dt.to_rfc3339())
}
