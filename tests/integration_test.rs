//! Integration tests for aws-cleanup.
#![allow(clippy::panic, clippy::expect_used)]

use aws_cleanup::cloudwatch::InMemoryLogs;
use aws_cleanup::{Error, LogsApi};

#[test]
fn test_error_types() {
    let err = Error::InvalidInput("test message".to_string());
    let display = format!("{err}");
    assert!(display.contains("invalid input"));
    assert!(display.contains("test message"));
    assert!(!err.is_fatal());

    let err = Error::OperationFailed {
        operation: "read_config_file".to_string(),
        cause: "file not found".to_string(),
    };
    let display = format!("{err}");
    assert!(display.contains("read_config_file"));
    assert!(display.contains("file not found"));
    assert!(!err.is_fatal());

    let err = Error::Api {
        operation: "DeleteLogStream",
        resource: "g1:s1".to_string(),
        cause: "ResourceNotFoundException".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "DeleteLogStream on 'g1:s1' failed: ResourceNotFoundException"
    );
    assert!(!err.is_fatal());

    let err = Error::SweepAborted {
        cause: "throttled".to_string(),
    };
    assert!(err.to_string().contains("sweep aborted"));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_delete_of_missing_resource_reports_identity() {
    let logs = InMemoryLogs::new();

    let err = logs
        .delete_log_stream("missing-group", "missing-stream")
        .await
        .expect_err("nothing to delete");

    match err {
        Error::Api {
            operation,
            resource,
            ..
        } => {
            assert_eq!(operation, "DeleteLogStream");
            assert!(resource.contains("missing-group"));
            assert!(resource.contains("missing-stream"));
        },
        other => panic!("unexpected error: {other}"),
    }
}
