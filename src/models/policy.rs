//! Retention policy.

use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Sentinel group filter selecting every log group.
pub const ALL_GROUPS: &str = "all";

/// Default stream retention in days.
pub const DEFAULT_STREAM_RETENTION_DAYS: i64 = 30;

/// Default group retention in days.
pub const DEFAULT_GROUP_RETENTION_DAYS: i64 = 90;

const SECONDS_PER_DAY: i64 = 86_400;

/// Which log groups a sweep covers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupScope {
    /// Every log group in the account/region.
    #[default]
    All,
    /// A single, explicitly named log group.
    ///
    /// An explicitly named group is deleted as soon as it has no streams;
    /// the group age check does not apply.
    Named(String),
}

impl GroupScope {
    /// Parses a group filter, treating [`ALL_GROUPS`] as the unrestricted scope.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or blank name.
    pub fn parse(filter: &str) -> Result<Self> {
        let filter = filter.trim();
        if filter.is_empty() {
            return Err(Error::InvalidInput(
                "log group name filter must not be empty".to_string(),
            ));
        }
        if filter == ALL_GROUPS {
            return Ok(Self::All);
        }
        Ok(Self::Named(filter.to_string()))
    }
}

impl fmt::Display for GroupScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_GROUPS),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Immutable configuration of one sweep.
///
/// Day thresholds are signed: a negative value moves the cutoff into the
/// future and makes deletion more permissive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionPolicy {
    /// Days since last activity after which a stream is expired.
    pub stream_retention_days: i64,
    /// Days since creation after which an empty group is expired.
    pub group_retention_days: i64,
    /// Groups covered by the sweep.
    pub scope: GroupScope,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            stream_retention_days: DEFAULT_STREAM_RETENTION_DAYS,
            group_retention_days: DEFAULT_GROUP_RETENTION_DAYS,
            scope: GroupScope::All,
        }
    }
}

impl RetentionPolicy {
    /// Creates a retention policy.
    #[must_use]
    pub const fn new(
        stream_retention_days: i64,
        group_retention_days: i64,
        scope: GroupScope,
    ) -> Self {
        Self {
            stream_retention_days,
            group_retention_days,
            scope,
        }
    }

    /// Streams whose reference timestamp is before this are expired.
    #[must_use]
    pub const fn stream_cutoff(&self, now: i64) -> i64 {
        cutoff(now, self.stream_retention_days)
    }

    /// Empty groups created before this are expired.
    #[must_use]
    pub const fn group_cutoff(&self, now: i64) -> i64 {
        cutoff(now, self.group_retention_days)
    }
}

/// Returns `now - days * 86400`, saturating at the `i64` bounds.
#[must_use]
pub const fn cutoff(now: i64, days: i64) -> i64 {
    now.saturating_sub(days.saturating_mul(SECONDS_PER_DAY))
}
