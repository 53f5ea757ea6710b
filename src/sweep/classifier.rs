//! Stream and group classification.
//!
//! The [`Classifier`] walks the group listing page by page, walks each
//! group's stream listing, and queues every expired stream and every
//! expired empty group on the matching candidate channel.
//!
//! Groups are classified strictly one after another. A group only becomes a
//! candidate once every page of its stream listing has been read and the
//! listing turned out empty across all pages.
//!
//! The classifier owns both channel senders. They are dropped, closing the
//! channels exactly once, when [`Classifier::classify_groups`] returns,
//! whether the sweep completed or was aborted.

use super::age::{format_timestamp, is_expired};
use crate::cloudwatch::LogsApi;
use crate::models::{GroupCandidate, GroupScope, LogGroupRef, RetentionPolicy, StreamCandidate};
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

/// Counters collected while classifying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Log groups whose streams were classified.
    pub groups_scanned: usize,
    /// Log streams seen across all groups.
    pub streams_scanned: usize,
    /// Stream candidates queued for deletion.
    pub stream_candidates: usize,
    /// Group candidates queued for deletion.
    pub group_candidates: usize,
    /// Groups skipped because their stream listing failed.
    pub group_listing_errors: usize,
}

/// Classifies log streams and log groups against a [`RetentionPolicy`].
pub struct Classifier {
    api: Arc<dyn LogsApi>,
    policy: RetentionPolicy,
    now: i64,
    streams_tx: mpsc::Sender<StreamCandidate>,
    groups_tx: mpsc::Sender<GroupCandidate>,
    stats: ScanStats,
}

impl Classifier {
    /// Creates a classifier.
    ///
    /// # Arguments
    ///
    /// * `api` - Shared CloudWatch Logs access.
    /// * `policy` - Retention thresholds and group scope.
    /// * `now` - Unix seconds every age is measured against.
    /// * `streams_tx` - Stream candidate queue.
    /// * `groups_tx` - Group candidate queue.
    #[must_use]
    pub fn new(
        api: Arc<dyn LogsApi>,
        policy: RetentionPolicy,
        now: i64,
        streams_tx: mpsc::Sender<StreamCandidate>,
        groups_tx: mpsc::Sender<GroupCandidate>,
    ) -> Self {
        Self {
            api,
            policy,
            now,
            streams_tx,
            groups_tx,
            stats: ScanStats::default(),
        }
    }

    /// Classifies every stream of one group.
    ///
    /// Queues each expired stream and returns how many streams the group
    /// holds in total across all listing pages.
    ///
    /// # Errors
    ///
    /// Returns the listing error as-is (no retry). Returns `SweepAborted` if
    /// the stream candidate queue has been closed.
    #[instrument(name = "aws_cleanup.classify_streams", skip(self))]
    pub async fn classify_streams(&mut self, group_name: &str) -> Result<usize> {
        let days = self.policy.stream_retention_days;
        let mut total = 0;
        let mut next_token = None;

        loop {
            let page = self
                .api
                .describe_log_streams(group_name, next_token.take())
                .await?;
            total += page.items.len();

            for stream in &page.items {
                self.stats.streams_scanned += 1;
                metrics::counter!("aws_cleanup_log_streams_scanned_total").increment(1);

                let reference = stream.reference_timestamp();
                if !is_expired(reference, days, self.now) {
                    debug!(
                        log_group = group_name,
                        log_stream = %stream.stream_name,
                        last_activity = %format_timestamp(reference),
                        "Keeping log stream"
                    );
                    continue;
                }

                info!(
                    log_group = group_name,
                    log_stream = %stream.stream_name,
                    last_activity = %format_timestamp(reference),
                    "Log stream expired"
                );
                self.streams_tx
                    .send(StreamCandidate::from(stream))
                    .await
                    .map_err(|_| queue_closed("stream"))?;
                self.stats.stream_candidates += 1;
                metrics::counter!("aws_cleanup_candidates_total", "kind" => "log_stream")
                    .increment(1);
            }

            let Some(token) = page.next_token else {
                break;
            };
            next_token = Some(token);
        }

        Ok(total)
    }

    /// Classifies the groups in scope, then closes both candidate channels.
    ///
    /// # Errors
    ///
    /// Returns `SweepAborted` if the group listing fails. Per-group stream
    /// listing failures are logged and skipped.
    #[instrument(
        name = "aws_cleanup.classify_groups",
        skip(self),
        fields(scope = %self.policy.scope)
    )]
    pub async fn classify_groups(mut self) -> Result<ScanStats> {
        match self.policy.scope.clone() {
            GroupScope::All => self.classify_all_groups().await?,
            GroupScope::Named(name) => self.classify_named_group(&name).await?,
        }

        info!(
            groups_scanned = self.stats.groups_scanned,
            streams_scanned = self.stats.streams_scanned,
            stream_candidates = self.stats.stream_candidates,
            group_candidates = self.stats.group_candidates,
            "Classification completed"
        );
        Ok(self.stats)
    }

    async fn classify_all_groups(&mut self) -> Result<()> {
        let group_cutoff = self.policy.group_cutoff(self.now);
        debug!(
            stream_cutoff = %format_timestamp(self.policy.stream_cutoff(self.now)),
            group_cutoff = %format_timestamp(group_cutoff),
            "Classifying all log groups"
        );

        let mut next_token = None;
        loop {
            let page = self
                .api
                .describe_log_groups(next_token.take())
                .await
                .map_err(|e| {
                    error!(error = %e, "DescribeLogGroups failed, aborting sweep");
                    Error::SweepAborted {
                        cause: e.to_string(),
                    }
                })?;

            for group in &page.items {
                self.classify_group(group).await?;
            }

            let Some(token) = page.next_token else {
                break;
            };
            next_token = Some(token);
        }

        Ok(())
    }

    async fn classify_group(&mut self, group: &LogGroupRef) -> Result<()> {
        self.stats.groups_scanned += 1;
        metrics::counter!("aws_cleanup_log_groups_scanned_total").increment(1);

        match self.classify_streams(&group.name).await {
            Ok(0) if is_expired(group.creation_time, self.policy.group_retention_days, self.now) => {
                info!(
                    log_group = %group.name,
                    created = %format_timestamp(group.creation_time),
                    "Log group empty and expired"
                );
                self.emit_group(&group.name).await?;
            },
            Ok(0) => debug!(
                log_group = %group.name,
                created = %format_timestamp(group.creation_time),
                "Keeping empty log group, too recent"
            ),
            Ok(streams) => debug!(log_group = %group.name, streams, "Keeping log group with streams"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.stats.group_listing_errors += 1;
                error!(log_group_arn = %group.arn, error = %e, "Getting log group streams failed");
            },
        }

        Ok(())
    }

    async fn classify_named_group(&mut self, group_name: &str) -> Result<()> {
        self.stats.groups_scanned += 1;
        metrics::counter!("aws_cleanup_log_groups_scanned_total").increment(1);

        match self.classify_streams(group_name).await {
            Ok(0) => {
                info!(log_group = group_name, "Named log group is empty");
                self.emit_group(group_name).await?;
            },
            Ok(streams) => debug!(log_group = group_name, streams, "Keeping named log group with streams"),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.stats.group_listing_errors += 1;
                error!(log_group = group_name, error = %e, "Getting log group streams failed");
            },
        }

        Ok(())
    }

    async fn emit_group(&mut self, group_name: &str) -> Result<()> {
        self.groups_tx
            .send(GroupCandidate::new(group_name))
            .await
            .map_err(|_| queue_closed("group"))?;
        self.stats.group_candidates += 1;
        metrics::counter!("aws_cleanup_candidates_total", "kind" => "log_group").increment(1);
        Ok(())
    }
}

fn queue_closed(kind: &str) -> Error {
    Error::SweepAborted {
        cause: format!("{kind} deletion queue closed before classification finished"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloudwatch::{ApiCall, InMemoryLogs};
    use crate::models::LogStreamRef;

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 86_400;

    fn policy(scope: GroupScope) -> RetentionPolicy {
        RetentionPolicy::new(30, 90, scope)
    }

    async fn classify(
        logs: Arc<InMemoryLogs>,
        policy: RetentionPolicy,
    ) -> (Result<ScanStats>, Vec<StreamCandidate>, Vec<GroupCandidate>) {
        let (streams_tx, mut streams_rx) = mpsc::channel(64);
        let (groups_tx, mut groups_rx) = mpsc::channel(64);
        let classifier = Classifier::new(logs, policy, NOW, streams_tx, groups_tx);

        let result = classifier.classify_groups().await;

        let mut streams = Vec::new();
        while let Some(candidate) = streams_rx.recv().await {
            streams.push(candidate);
        }
        let mut groups = Vec::new();
        while let Some(candidate) = groups_rx.recv().await {
            groups.push(candidate);
        }
        (result, streams, groups)
    }

    #[tokio::test]
    async fn test_recent_last_event_is_kept_regardless_of_creation() {
        let logs = Arc::new(InMemoryLogs::new().with_group(
            LogGroupRef::new("g1", NOW - 400 * DAY),
            vec![
                LogStreamRef::new("g1", "active", NOW - 400 * DAY).with_last_event(NOW - DAY),
                LogStreamRef::new("g1", "stale", NOW - 400 * DAY).with_last_event(NOW - 40 * DAY),
                LogStreamRef::new("g1", "never-written", NOW - 31 * DAY),
            ],
        ));

        let (result, streams, groups) = classify(logs, policy(GroupScope::All)).await;

        let stats = result.expect("classification succeeds");
        assert_eq!(stats.streams_scanned, 3);
        assert_eq!(
            streams,
            vec![
                StreamCandidate::new("g1", "stale"),
                StreamCandidate::new("g1", "never-written"),
            ]
        );
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_group_with_expired_stream_is_not_a_candidate() {
        let logs = Arc::new(InMemoryLogs::new().with_group(
            LogGroupRef::new("g2", NOW - 400 * DAY),
            vec![LogStreamRef::new("g2", "old", NOW - 400 * DAY).with_last_event(NOW - 40 * DAY)],
        ));

        let (_, streams, groups) = classify(logs, policy(GroupScope::All)).await;

        assert_eq!(streams, vec![StreamCandidate::new("g2", "old")]);
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_empty_group_respects_group_age() {
        let logs = Arc::new(
            InMemoryLogs::new()
                .with_group(LogGroupRef::new("old-empty", NOW - 100 * DAY), vec![])
                .with_group(LogGroupRef::new("new-empty", NOW - DAY), vec![]),
        );

        let (_, _, groups) = classify(logs, policy(GroupScope::All)).await;

        assert_eq!(groups, vec![GroupCandidate::new("old-empty")]);
    }

    #[tokio::test]
    async fn test_emptiness_counts_every_stream_page() {
        // Last page empty while an earlier page holds a stream.
        let logs = Arc::new(InMemoryLogs::new().with_group_pages(
            LogGroupRef::new("g1", NOW - 100 * DAY),
            vec![
                vec![LogStreamRef::new("g1", "fresh", NOW).with_last_event(NOW)],
                vec![],
            ],
        ));

        let (result, streams, groups) = classify(Arc::clone(&logs), policy(GroupScope::All)).await;

        assert_eq!(result.expect("ok").streams_scanned, 1);
        assert!(streams.is_empty());
        assert!(groups.is_empty());
        assert_eq!(
            logs.calls()
                .iter()
                .filter(|c| matches!(c, ApiCall::DescribeLogStreams { .. }))
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_named_scope_skips_group_age_check() {
        let logs = Arc::new(
            InMemoryLogs::new()
                .with_group(LogGroupRef::new("g3", NOW - DAY), vec![])
                .with_group(LogGroupRef::new("other", NOW - 400 * DAY), vec![]),
        );

        let (result, _, groups) = classify(
            Arc::clone(&logs),
            policy(GroupScope::Named("g3".to_string())),
        )
        .await;

        assert_eq!(result.expect("ok").groups_scanned, 1);
        assert_eq!(groups, vec![GroupCandidate::new("g3")]);
        assert!(
            !logs
                .calls()
                .iter()
                .any(|c| matches!(c, ApiCall::DescribeLogGroups { .. }))
        );
    }

    #[tokio::test]
    async fn test_named_scope_keeps_group_with_streams() {
        let logs = Arc::new(InMemoryLogs::new().with_group(
            LogGroupRef::new("g3", NOW - DAY),
            vec![LogStreamRef::new("g3", "s", NOW - 40 * DAY)],
        ));

        let (_, streams, groups) =
            classify(logs, policy(GroupScope::Named("g3".to_string()))).await;

        assert_eq!(streams, vec![StreamCandidate::new("g3", "s")]);
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn test_stream_listing_failure_skips_only_that_group() {
        let logs = Arc::new(
            InMemoryLogs::new()
                .with_group(LogGroupRef::new("broken", NOW - 100 * DAY), vec![])
                .with_group(LogGroupRef::new("fine", NOW - 100 * DAY), vec![])
                .failing_stream_listing("broken"),
        );

        let (result, _, groups) = classify(logs, policy(GroupScope::All)).await;

        let stats = result.expect("sweep continues");
        assert_eq!(stats.group_listing_errors, 1);
        assert_eq!(stats.groups_scanned, 2);
        assert_eq!(groups, vec![GroupCandidate::new("fine")]);
    }

    #[tokio::test]
    async fn test_group_listing_failure_is_fatal_and_closes_channels() {
        let logs = Arc::new(
            InMemoryLogs::new()
                .with_page_size(1)
                .with_group(LogGroupRef::new("g1", NOW - 100 * DAY), vec![])
                .with_group(LogGroupRef::new("g2", NOW - 100 * DAY), vec![])
                .failing_group_listing_at(1),
        );

        let (result, _, groups) = classify(logs, policy(GroupScope::All)).await;

        assert!(matches!(result, Err(Error::SweepAborted { .. })));
        // The first page was classified before the failure.
        assert_eq!(groups, vec![GroupCandidate::new("g1")]);
    }

    #[tokio::test]
    async fn test_channels_close_after_last_group_page() {
        let groups: Vec<LogGroupRef> = (0..5)
            .map(|i| LogGroupRef::new(format!("g{i}"), NOW - 100 * DAY))
            .collect();
        let logs = groups.into_iter().fold(InMemoryLogs::new().with_page_size(2), |logs, g| {
            logs.with_group(g, vec![])
        });
        let logs = Arc::new(logs);

        let (streams_tx, mut streams_rx) = mpsc::channel(1);
        let (groups_tx, mut groups_rx) = mpsc::channel(1);
        let classifier = Classifier::new(
            Arc::clone(&logs) as Arc<dyn LogsApi>,
            policy(GroupScope::All),
            NOW,
            streams_tx,
            groups_tx,
        );

        let observer = {
            let logs = Arc::clone(&logs);
            tokio::spawn(async move {
                let mut received = 0;
                while groups_rx.recv().await.is_some() {
                    received += 1;
                }
                let pages_at_close = logs.group_pages_served();
                assert!(streams_rx.recv().await.is_none());
                (received, pages_at_close)
            })
        };

        classifier.classify_groups().await.expect("ok");
        let (received, pages_at_close) = observer.await.expect("observer");

        assert_eq!(received, 5);
        assert_eq!(pages_at_close, 3);
    }

    #[tokio::test]
    async fn test_closed_queue_aborts() {
        let logs = Arc::new(
            InMemoryLogs::new().with_group(LogGroupRef::new("g1", NOW - 100 * DAY), vec![]),
        );
        let (streams_tx, _streams_rx) = mpsc::channel(1);
        let (groups_tx, groups_rx) = mpsc::channel(1);
        drop(groups_rx);

        let classifier =
            Classifier::new(logs, policy(GroupScope::All), NOW, streams_tx, groups_tx);

        assert!(matches!(
            classifier.classify_groups().await,
            Err(Error::SweepAborted { .. })
        ));
    }
}
