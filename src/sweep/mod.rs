//! Retention sweep.
//!
//! A sweep is a two-stage pipeline:
//!
//! ```text
//! DescribeLogGroups ──> Classifier ──(stream queue)──> DeletionSink ──> DeleteLogStream
//!   DescribeLogStreams      │
//!                           └────────(group queue)───> DeletionSink ──> DeleteLogGroup
//! ```
//!
//! The [`Sweeper`] starts both sinks as background tasks, runs the
//! [`Classifier`] on the calling task, and waits for both sinks to drain.
//! The queues are bounded, so a slow sink throttles the scan instead of
//! buffering candidates without limit.
//!
//! # Error handling
//!
//! | Failure | Effect |
//! |---------|--------|
//! | `DescribeLogGroups` | Fatal, the sweep returns `SweepAborted` |
//! | `DescribeLogStreams` for one group | Logged, group skipped |
//! | `DeleteLogStream` / `DeleteLogGroup` | Logged, next candidate attempted |
//!
//! Nothing is retried.

mod age;
mod classifier;
mod orchestrator;
mod sink;

pub use age::{format_timestamp, is_expired};
pub use classifier::{Classifier, ScanStats};
pub use orchestrator::{DEFAULT_QUEUE_CAPACITY, SweepReport, Sweeper};
pub use sink::{Deletable, DeletionSink, SinkReport};
