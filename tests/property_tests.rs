//! Property-based tests for the retention rules.
//!
//! Uses proptest to verify invariants across random inputs:
//! - The age cutoff is exclusive on the "still live" side
//! - Group filters parse to the scope they name
//! - A sweep never deletes a stream with recent activity

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use aws_cleanup::cloudwatch::{ApiCall, InMemoryLogs};
use aws_cleanup::models::cutoff;
use aws_cleanup::sweep::is_expired;
use aws_cleanup::{GroupScope, LogGroupRef, LogStreamRef, LogsApi, RetentionPolicy, Sweeper};
use proptest::prelude::*;

const DAY: i64 = 86_400;

fn run_sweep(logs: &Arc<InMemoryLogs>, policy: RetentionPolicy, now: i64) {
    tokio_test::block_on(
        Sweeper::new(Arc::clone(logs) as Arc<dyn LogsApi>, policy)
            .with_now(now)
            .run(),
    )
    .expect("sweep succeeds");
}

proptest! {
    /// Property: one second past the cutoff is expired, one second before is not.
    #[test]
    fn prop_cutoff_boundary(
        now in 0_i64..4_000_000_000,
        threshold in 0_i64..3650,
    ) {
        let boundary = now - threshold * DAY;
        prop_assert!(is_expired(boundary - 1, threshold, now));
        prop_assert!(!is_expired(boundary + 1, threshold, now));
        prop_assert!(!is_expired(boundary, threshold, now));
    }

    /// Property: a larger threshold never expires more.
    #[test]
    fn prop_expiry_is_monotonic_in_threshold(
        now in 0_i64..4_000_000_000,
        reference in 0_i64..4_000_000_000,
        threshold in 0_i64..3650,
        extra in 0_i64..3650,
    ) {
        if is_expired(reference, threshold + extra, now) {
            prop_assert!(is_expired(reference, threshold, now));
        }
    }

    /// Property: cutoff never panics, even for extreme inputs.
    #[test]
    fn prop_cutoff_saturates(now in any::<i64>(), days in any::<i64>()) {
        let _ = cutoff(now, days);
    }

    /// Property: any non-blank name other than "all" is a named scope.
    #[test]
    fn prop_named_scope_roundtrips(name in "/?[a-zA-Z0-9_./#-]{1,64}") {
        prop_assume!(name != "all");
        let scope = GroupScope::parse(&name).expect("valid name");
        prop_assert_eq!(scope.to_string(), name.clone());
        prop_assert_eq!(scope, GroupScope::Named(name));
    }

    /// Property: blank filters are rejected.
    #[test]
    fn prop_blank_scope_rejected(blank in "[ \t]{0,8}") {
        prop_assert!(GroupScope::parse(&blank).is_err());
    }

    /// Property: streams active within the retention window are never deleted,
    /// whatever their creation time.
    #[test]
    fn prop_recent_streams_survive(
        ages in prop::collection::vec((0_i64..60, 0_i64..400), 1..20),
        retention in 0_i64..60,
        page_size in 1_usize..5,
    ) {
        let now = 1_750_000_000;
        let streams: Vec<LogStreamRef> = ages
            .iter()
            .enumerate()
            .map(|(i, (idle_days, created_days))| {
                LogStreamRef::new("g", format!("s{i}"), now - created_days * DAY)
                    .with_last_event(now - idle_days * DAY)
            })
            .collect();
        let logs = Arc::new(
            InMemoryLogs::new()
                .with_page_size(page_size)
                .with_group(LogGroupRef::new("g", now - 400 * DAY), streams),
        );

        run_sweep(&logs, RetentionPolicy::new(retention, 90, GroupScope::All), now);

        let deleted: Vec<usize> = logs
            .calls()
            .iter()
            .filter_map(|call| match call {
                ApiCall::DeleteLogStream { stream, .. } => stream[1..].parse().ok(),
                _ => None,
            })
            .collect();
        for (i, (idle_days, _)) in ages.iter().enumerate() {
            let expired = *idle_days > retention;
            prop_assert_eq!(deleted.contains(&i), expired, "stream s{} idle {} days", i, idle_days);
        }
        // the group held streams at scan time
        prop_assert!(logs.has_group("g"));
    }
}
