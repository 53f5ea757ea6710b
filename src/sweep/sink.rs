//! Deletion sinks.
//!
//! A [`DeletionSink`] drains one candidate queue until it is closed and
//! issues one delete call per candidate, in queue order. A failed deletion
//! is logged with the full resource identity and the sink moves on to the
//! next candidate.

use crate::Result;
use crate::cloudwatch::LogsApi;
use crate::models::{GroupCandidate, StreamCandidate};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info};

/// A candidate a [`DeletionSink`] knows how to delete.
#[async_trait]
pub trait Deletable: fmt::Display + Send + Sync + 'static {
    /// Resource kind used in logs and metric labels.
    const KIND: &'static str;

    /// Owning (or own) log group name.
    fn group_name(&self) -> &str;

    /// Log stream name, for stream candidates.
    fn stream_name(&self) -> Option<&str> {
        None
    }

    /// Issues the delete call.
    async fn delete(&self, api: &dyn LogsApi) -> Result<()>;
}

#[async_trait]
impl Deletable for StreamCandidate {
    const KIND: &'static str = "log_stream";

    fn group_name(&self) -> &str {
        &self.group_name
    }

    fn stream_name(&self) -> Option<&str> {
        Some(&self.stream_name)
    }

    async fn delete(&self, api: &dyn LogsApi) -> Result<()> {
        api.delete_log_stream(&self.group_name, &self.stream_name)
            .await
    }
}

#[async_trait]
impl Deletable for GroupCandidate {
    const KIND: &'static str = "log_group";

    fn group_name(&self) -> &str {
        &self.group_name
    }

    async fn delete(&self, api: &dyn LogsApi) -> Result<()> {
        api.delete_log_group(&self.group_name).await
    }
}

/// Outcome counts of one sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SinkReport {
    /// Delete calls issued.
    pub attempted: usize,
    /// Delete calls that succeeded.
    pub deleted: usize,
    /// Delete calls that failed.
    pub failed: usize,
}

/// Consumer that deletes every candidate it receives.
pub struct DeletionSink {
    api: Arc<dyn LogsApi>,
}

impl DeletionSink {
    /// Creates a sink issuing calls through `api`.
    #[must_use]
    pub fn new(api: Arc<dyn LogsApi>) -> Self {
        Self { api }
    }

    /// Deletes candidates until `candidates` is closed and empty.
    pub async fn drain<T: Deletable>(self, mut candidates: mpsc::Receiver<T>) -> SinkReport {
        let mut report = SinkReport::default();

        while let Some(candidate) = candidates.recv().await {
            report.attempted += 1;
            info!(
                kind = T::KIND,
                log_group = candidate.group_name(),
                log_stream = candidate.stream_name(),
                "Deleting {}",
                T::KIND
            );

            match candidate.delete(self.api.as_ref()).await {
                Ok(()) => {
                    report.deleted += 1;
                    metrics::counter!(
                        "aws_cleanup_deletions_total",
                        "kind" => T::KIND,
                        "outcome" => "deleted"
                    )
                    .increment(1);
                },
                Err(e) => {
                    report.failed += 1;
                    metrics::counter!(
                        "aws_cleanup_deletions_total",
                        "kind" => T::KIND,
                        "outcome" => "failed"
                    )
                    .increment(1);
                    error!(
                        kind = T::KIND,
                        log_group = candidate.group_name(),
                        log_stream = candidate.stream_name(),
                        error = %e,
                        "Deleting {candidate} failed"
                    );
                },
            }
        }

        report
    }

    /// Runs [`Self::drain`] as a background task in the current span.
    #[must_use]
    pub fn spawn<T: Deletable>(self, candidates: mpsc::Receiver<T>) -> JoinHandle<SinkReport> {
        tokio::spawn(self.drain(candidates).in_current_span())
    }
}
