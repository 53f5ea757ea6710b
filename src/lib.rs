//! # aws-cleanup
//!
//! Retention sweeper for AWS CloudWatch Logs.
//!
//! A sweep scans every log group (or a single named group), classifies each
//! log stream and log group against a retention policy, and deletes the
//! expired ones:
//!
//! - Log streams are expired when their last event (or, with no events,
//!   their creation) is older than the stream retention threshold.
//! - Log groups are expired when they have no streams left and were created
//!   before the group retention threshold.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use aws_cleanup::cloudwatch::{AwsSettings, CloudWatchLogsClient};
//! use aws_cleanup::sweep::Sweeper;
//! use aws_cleanup::{GroupScope, RetentionPolicy};
//!
//! let client = CloudWatchLogsClient::from_settings(&AwsSettings::default()).await;
//! let policy = RetentionPolicy::new(30, 90, GroupScope::All);
//! let report = Sweeper::new(Arc::new(client), policy).run().await?;
//! println!("{}", report.summary());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// Duplicate transitive versions come from the AWS SDK dependency tree.
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cloudwatch;
pub mod config;
pub mod models;
pub mod observability;
pub mod sweep;

// Re-exports for convenience
pub use cloudwatch::{LogsApi, Page};
pub use config::CleanupConfig;
pub use models::{
    GroupCandidate, GroupScope, LogGroupRef, LogStreamRef, RetentionPolicy, StreamCandidate,
};
pub use sweep::{SinkReport, SweepReport, Sweeper};

/// Service name attached to every log line.
pub const SERVICE: &str = "aws-cleanup";

/// Short service description.
pub const DESCRIPTION: &str = "Cleaning AWS";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error type for aws-cleanup operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty group name, unparsable config values |
/// | `OperationFailed` | Config file I/O, logging/metrics init, task join failures |
/// | `Api` | Any CloudWatch Logs call returns an error |
/// | `SweepAborted` | The top-level log group listing fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A local operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A remote CloudWatch Logs call failed.
    ///
    /// Raised for a single resource. The sweep logs it and moves on, except
    /// when the failing call is the log group listing itself.
    #[error("{operation} on '{resource}' failed: {cause}")]
    Api {
        /// Remote operation name, e.g. `DeleteLogStream`.
        operation: &'static str,
        /// Identity of the resource the call targeted.
        resource: String,
        /// Message returned by the remote service.
        cause: String,
    },

    /// The sweep could not enumerate log groups and was abandoned.
    ///
    /// No deletion is known to be safe without a complete scan, so this is
    /// the only fatal error class.
    #[error("sweep aborted: {cause}")]
    SweepAborted {
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns `true` if this error must terminate the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SweepAborted { .. })
    }
}

/// Result type alias for aws-cleanup operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use aws_cleanup::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
