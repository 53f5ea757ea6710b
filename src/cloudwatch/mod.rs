//! CloudWatch Logs access.
//!
//! The sweep only talks to CloudWatch Logs through [`LogsApi`]: one call per
//! listing page plus the two delete calls. [`CloudWatchLogsClient`] is the
//! AWS SDK implementation; [`InMemoryLogs`] is a scriptable in-process
//! implementation with failure injection.

mod client;
mod memory;

pub use client::{AwsSettings, CloudWatchLogsClient};
pub use memory::{ApiCall, InMemoryLogs};

use crate::Result;
use crate::models::{LogGroupRef, LogStreamRef};
use async_trait::async_trait;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub items: Vec<T>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// Creates the final page of a listing.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }

    /// Returns `true` if no further page follows.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

/// Remote log-management operations needed by a sweep.
///
/// Implementations must be safe to call concurrently: the classifier and
/// both deletion sinks share one instance.
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// Fetches one page of the log group listing.
    ///
    /// Pass `None` for the first page, then each page's `next_token`.
    async fn describe_log_groups(&self, next_token: Option<String>) -> Result<Page<LogGroupRef>>;

    /// Fetches one page of a log group's stream listing.
    async fn describe_log_streams(
        &self,
        group_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<LogStreamRef>>;

    /// Deletes one log stream.
    async fn delete_log_stream(&self, group_name: &str, stream_name: &str) -> Result<()>;

    /// Deletes one log group.
    async fn delete_log_group(&self, group_name: &str) -> Result<()>;
}
