//! Log group and log stream references.

use serde::Serialize;
use std::fmt;

/// A log group as returned by one page of the group listing.
///
/// Timestamps are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupRef {
    /// Log group name.
    pub name: String,
    /// Log group ARN (used to identify the group in error logs).
    pub arn: String,
    /// Creation time.
    pub creation_time: i64,
}

impl LogGroupRef {
    /// Creates a group reference. The ARN defaults to the name.
    #[must_use]
    pub fn new(name: impl Into<String>, creation_time: i64) -> Self {
        let name = name.into();
        Self {
            arn: name.clone(),
            name,
            creation_time,
        }
    }

    /// Sets the ARN.
    #[must_use]
    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = arn.into();
        self
    }
}

/// A log stream as returned by one page of a group's stream listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamRef {
    /// Owning log group.
    pub group_name: String,
    /// Log stream name.
    pub stream_name: String,
    /// Creation time.
    pub creation_time: i64,
    /// Timestamp of the most recent event, absent for streams never written to.
    pub last_event_timestamp: Option<i64>,
}

impl LogStreamRef {
    /// Creates a stream reference with no recorded events.
    #[must_use]
    pub fn new(
        group_name: impl Into<String>,
        stream_name: impl Into<String>,
        creation_time: i64,
    ) -> Self {
        Self {
            group_name: group_name.into(),
            stream_name: stream_name.into(),
            creation_time,
            last_event_timestamp: None,
        }
    }

    /// Sets the last event timestamp.
    #[must_use]
    pub const fn with_last_event(mut self, timestamp: i64) -> Self {
        self.last_event_timestamp = Some(timestamp);
        self
    }

    /// Timestamp the stream's age is judged by.
    ///
    /// The last event if one was recorded, otherwise the stream's own creation.
    #[must_use]
    pub fn reference_timestamp(&self) -> i64 {
        self.last_event_timestamp.unwrap_or(self.creation_time)
    }
}

/// A log stream queued for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StreamCandidate {
    /// Owning log group.
    pub group_name: String,
    /// Log stream name.
    pub stream_name: String,
}

impl StreamCandidate {
    /// Creates a stream candidate.
    #[must_use]
    pub fn new(group_name: impl Into<String>, stream_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            stream_name: stream_name.into(),
        }
    }
}

impl From<&LogStreamRef> for StreamCandidate {
    fn from(stream: &LogStreamRef) -> Self {
        Self::new(stream.group_name.clone(), stream.stream_name.clone())
    }
}

impl fmt::Display for StreamCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_name, self.stream_name)
    }
}

/// A log group queued for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupCandidate {
    /// Log group name.
    pub group_name: String,
}

impl GroupCandidate {
    /// Creates a group candidate.
    #[must_use]
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
        }
    }
}

impl fmt::Display for GroupCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.group_name)
    }
}
