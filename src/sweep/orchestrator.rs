//! Sweep orchestration.

use super::classifier::{Classifier, ScanStats};
use super::sink::{DeletionSink, SinkReport};
use crate::cloudwatch::LogsApi;
use crate::models::RetentionPolicy;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};

/// Default candidate queue capacity.
///
/// One slot keeps the hand-off close to a rendezvous: the classifier waits
/// whenever a sink falls behind.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Safely converts Duration to milliseconds as u64, capping at `u64::MAX`.
#[inline]
fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts u64 to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn u64_to_f64(value: u64) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

/// Result of a completed sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Classification counters.
    pub scan: ScanStats,
    /// Stream sink outcome.
    pub streams: SinkReport,
    /// Group sink outcome.
    pub groups: SinkReport,
    /// Wall-clock duration of the sweep in milliseconds.
    pub duration_ms: u64,
}

impl SweepReport {
    /// Returns `true` if any delete call or stream listing failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.streams.failed > 0 || self.groups.failed > 0 || self.scan.group_listing_errors > 0
    }

    /// Returns a human-readable summary of the sweep.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.streams.attempted == 0 && self.groups.attempted == 0 {
            return format!(
                "Nothing expired ({} log groups, {} log streams checked in {}ms)",
                self.scan.groups_scanned, self.scan.streams_scanned, self.duration_ms
            );
        }

        format!(
            "Deleted {} log streams and {} log groups ({} failed) - checked {} log groups, {} log streams in {}ms",
            self.streams.deleted,
            self.groups.deleted,
            self.streams.failed + self.groups.failed,
            self.scan.groups_scanned,
            self.scan.streams_scanned,
            self.duration_ms
        )
    }
}

/// Runs one sweep: classification plus both deletion sinks.
pub struct Sweeper {
    api: Arc<dyn LogsApi>,
    policy: RetentionPolicy,
    queue_capacity: usize,
    now: Option<i64>,
}

impl Sweeper {
    /// Creates a sweeper.
    ///
    /// # Arguments
    ///
    /// * `api` - Authenticated CloudWatch Logs access, shared by every stage.
    /// * `policy` - Retention policy for this sweep.
    #[must_use]
    pub fn new(api: Arc<dyn LogsApi>, policy: RetentionPolicy) -> Self {
        Self {
            api,
            policy,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            now: None,
        }
    }

    /// Sets the capacity of each candidate queue (minimum 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Pins the instant ages are measured against (Unix seconds).
    ///
    /// Defaults to the time [`Self::run`] is called.
    #[must_use]
    pub const fn with_now(mut self, now: i64) -> Self {
        self.now = Some(now);
        self
    }

    /// Runs the sweep to completion.
    ///
    /// Both sinks are started first, then classification runs on the calling
    /// task. Returns once classification has finished and both sinks have
    /// drained their queues.
    ///
    /// # Errors
    ///
    /// Returns `SweepAborted` if the log group listing fails; pending
    /// deletions are abandoned in that case, and both sinks have stopped
    /// by the time the error is returned. Returns `OperationFailed` if a
    /// sink task panicked.
    #[instrument(
        name = "aws_cleanup.sweep",
        skip(self),
        fields(
            stream_retention_days = self.policy.stream_retention_days,
            group_retention_days = self.policy.group_retention_days,
            scope = %self.policy.scope,
            queue_capacity = self.queue_capacity
        )
    )]
    pub async fn run(self) -> Result<SweepReport> {
        let start = Instant::now();
        let now = self.now.unwrap_or_else(crate::current_timestamp);

        let (streams_tx, streams_rx) = mpsc::channel(self.queue_capacity);
        let (groups_tx, groups_rx) = mpsc::channel(self.queue_capacity);

        let stream_sink = DeletionSink::new(Arc::clone(&self.api)).spawn(streams_rx);
        let group_sink = DeletionSink::new(Arc::clone(&self.api)).spawn(groups_rx);

        let classifier = Classifier::new(self.api, self.policy, now, streams_tx, groups_tx);
        let scan = match classifier.classify_groups().await {
            Ok(scan) => scan,
            Err(e) => {
                stream_sink.abort();
                group_sink.abort();
                let (streams, groups) = tokio::join!(stream_sink, group_sink);
                for joined in [streams.map(drop), groups.map(drop)] {
                    if let Err(join) = joined
                        && !join.is_cancelled()
                    {
                        warn!(error = %join, "Deletion sink failed while aborting");
                    }
                }
                metrics::counter!("aws_cleanup_sweeps_total", "outcome" => "aborted").increment(1);
                error!(error = %e, "Sweep aborted");
                return Err(e);
            },
        };

        let (streams, groups) = tokio::join!(stream_sink, group_sink);
        let mut report = SweepReport {
            scan,
            streams: streams.map_err(sink_join_error)?,
            groups: groups.map_err(sink_join_error)?,
            duration_ms: 0,
        };
        report.duration_ms = duration_to_millis(start.elapsed());

        metrics::counter!("aws_cleanup_sweeps_total", "outcome" => "completed").increment(1);
        metrics::histogram!("aws_cleanup_sweep_duration_ms").record(u64_to_f64(report.duration_ms));

        info!(
            groups_scanned = report.scan.groups_scanned,
            streams_scanned = report.scan.streams_scanned,
            streams_deleted = report.streams.deleted,
            groups_deleted = report.groups.deleted,
            deletions_failed = report.streams.failed + report.groups.failed,
            duration_ms = report.duration_ms,
            "Sweep completed"
        );

        Ok(report)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn sink_join_error(e: JoinError) -> Error {
    Error::OperationFailed {
        operation: "join_deletion_sink".to_string(),
        cause: e.to_string(),
    }
}
