//! End-to-end sweep tests against the in-memory CloudWatch Logs backend.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use aws_cleanup::cloudwatch::{ApiCall, InMemoryLogs};
use aws_cleanup::{
    Error, GroupScope, LogGroupRef, LogStreamRef, LogsApi, RetentionPolicy, Sweeper,
};

const NOW: i64 = 1_750_000_000;
const DAY: i64 = 86_400;

fn sweeper(logs: &Arc<InMemoryLogs>, policy: RetentionPolicy) -> Sweeper {
    Sweeper::new(Arc::clone(logs) as Arc<dyn LogsApi>, policy).with_now(NOW)
}

fn deleted_groups(calls: &[ApiCall]) -> Vec<String> {
    calls
        .iter()
        .filter_map(|call| match call {
            ApiCall::DeleteLogGroup { group } => Some(group.clone()),
            _ => None,
        })
        .collect()
}

fn deleted_streams(calls: &[ApiCall]) -> Vec<(String, String)> {
    calls
        .iter()
        .filter_map(|call| match call {
            ApiCall::DeleteLogStream { group, stream } => Some((group.clone(), stream.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_all_groups_scenario() {
    let logs = Arc::new(
        InMemoryLogs::new()
            .with_group(LogGroupRef::new("g1", NOW - 100 * DAY), vec![])
            .with_group(
                LogGroupRef::new("g2", NOW - 100 * DAY),
                vec![LogStreamRef::new("g2", "old", NOW - 100 * DAY).with_last_event(NOW - 40 * DAY)],
            ),
    );

    let report = sweeper(&logs, RetentionPolicy::new(30, 90, GroupScope::All))
        .run()
        .await
        .expect("sweep succeeds");

    let calls = logs.calls();
    assert_eq!(deleted_groups(&calls), vec!["g1".to_string()]);
    assert_eq!(
        deleted_streams(&calls),
        vec![("g2".to_string(), "old".to_string())]
    );
    assert_eq!(report.scan.groups_scanned, 2);
    assert_eq!(report.scan.streams_scanned, 1);
    assert_eq!(report.streams.deleted, 1);
    assert_eq!(report.groups.deleted, 1);
    assert!(!report.has_failures());
    assert!(logs.has_group("g2"));
}

#[tokio::test]
async fn test_second_sweep_removes_group_emptied_by_first() {
    let logs = Arc::new(InMemoryLogs::new().with_group(
        LogGroupRef::new("g2", NOW - 100 * DAY),
        vec![LogStreamRef::new("g2", "old", NOW - 100 * DAY).with_last_event(NOW - 40 * DAY)],
    ));
    let policy = RetentionPolicy::new(30, 90, GroupScope::All);

    let first = sweeper(&logs, policy.clone()).run().await.expect("first sweep");
    assert_eq!(first.groups.attempted, 0);

    let second = sweeper(&logs, policy).run().await.expect("second sweep");
    assert_eq!(second.groups.deleted, 1);
    assert!(!logs.has_group("g2"));
}

#[tokio::test]
async fn test_named_group_skips_age_check() {
    let logs = Arc::new(
        InMemoryLogs::new()
            .with_group(LogGroupRef::new("g1", NOW - 100 * DAY), vec![])
            .with_group(LogGroupRef::new("g3", NOW - DAY), vec![]),
    );

    let policy = RetentionPolicy::new(30, 90, GroupScope::parse("g3").expect("scope"));
    let report = sweeper(&logs, policy).run().await.expect("sweep succeeds");

    let calls = logs.calls();
    assert_eq!(deleted_groups(&calls), vec!["g3".to_string()]);
    assert!(
        !calls
            .iter()
            .any(|call| matches!(call, ApiCall::DescribeLogGroups { .. }))
    );
    assert_eq!(report.groups.deleted, 1);
    assert!(logs.has_group("g1"));
}

#[tokio::test]
async fn test_recent_group_is_kept_in_all_mode() {
    let logs = Arc::new(InMemoryLogs::new().with_group(LogGroupRef::new("g3", NOW - DAY), vec![]));

    let report = sweeper(&logs, RetentionPolicy::default())
        .run()
        .await
        .expect("sweep succeeds");

    assert_eq!(report.groups.attempted, 0);
    assert!(logs.has_group("g3"));
    assert!(report.summary().starts_with("Nothing expired"));
}

#[tokio::test]
async fn test_failed_delete_does_not_stop_later_deletes() {
    let logs = Arc::new(
        InMemoryLogs::new()
            .with_group(
                LogGroupRef::new("g1", NOW),
                vec![
                    LogStreamRef::new("g1", "a", NOW - 60 * DAY),
                    LogStreamRef::new("g1", "b", NOW - 60 * DAY),
                ],
            )
            .failing_next_deletes(1),
    );

    let report = sweeper(&logs, RetentionPolicy::default())
        .run()
        .await
        .expect("per-item failures are not fatal");

    assert_eq!(
        deleted_streams(&logs.calls()),
        vec![
            ("g1".to_string(), "a".to_string()),
            ("g1".to_string(), "b".to_string()),
        ]
    );
    assert_eq!(report.streams.failed, 1);
    assert_eq!(report.streams.deleted, 1);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_stream_listing_failure_skips_one_group() {
    let logs = Arc::new(
        InMemoryLogs::new()
            .with_group(LogGroupRef::new("broken", NOW - 100 * DAY), vec![])
            .with_group(LogGroupRef::new("empty", NOW - 100 * DAY), vec![])
            .failing_stream_listing("broken"),
    );

    let report = sweeper(&logs, RetentionPolicy::default())
        .run()
        .await
        .expect("per-group failures are not fatal");

    assert_eq!(deleted_groups(&logs.calls()), vec!["empty".to_string()]);
    assert_eq!(report.scan.group_listing_errors, 1);
    assert!(logs.has_group("broken"));
}

#[tokio::test]
async fn test_group_listing_failure_aborts_without_deleting() {
    let logs = Arc::new(
        InMemoryLogs::new()
            .with_page_size(1)
            .with_group(LogGroupRef::new("g1", NOW - 100 * DAY), vec![])
            .with_group(LogGroupRef::new("g2", NOW - 100 * DAY), vec![])
            .failing_group_listing_at(1),
    );

    let err = sweeper(&logs, RetentionPolicy::default())
        .run()
        .await
        .expect_err("listing failure is fatal");

    assert!(matches!(err, Error::SweepAborted { .. }));
    assert!(err.is_fatal());
    assert!(logs.has_group("g2"));
}

#[tokio::test]
async fn test_multi_page_listing_is_fully_consumed() {
    let mut logs = InMemoryLogs::new().with_page_size(2);
    for i in 0..5 {
        logs = logs.with_group(LogGroupRef::new(format!("g{i}"), NOW - 100 * DAY), vec![]);
    }
    let logs = Arc::new(logs);

    let report = sweeper(&logs, RetentionPolicy::default())
        .with_queue_capacity(4)
        .run()
        .await
        .expect("sweep succeeds");

    assert_eq!(logs.group_pages_served(), 3);
    assert_eq!(report.scan.groups_scanned, 5);
    assert_eq!(report.groups.deleted, 5);
}
