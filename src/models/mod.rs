//! Data models for aws-cleanup.
//!
//! Resource references materialized from the remote listings, the deletion
//! candidates handed to the sinks, and the retention policy driving a sweep.

mod policy;
mod resource;

pub use policy::{
    ALL_GROUPS, DEFAULT_GROUP_RETENTION_DAYS, DEFAULT_STREAM_RETENTION_DAYS, GroupScope,
    RetentionPolicy, cutoff,
};
pub use resource::{GroupCandidate, LogGroupRef, LogStreamRef, StreamCandidate};
