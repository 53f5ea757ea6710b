//! AWS SDK implementation of [`LogsApi`].
//!
//! Uses the standard AWS credential chain (environment, shared profile,
//! instance/task role). Credentials are never handled by the sweep itself.

use super::{LogsApi, Page};
use crate::models::{LogGroupRef, LogStreamRef};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::types::{LogGroup, LogStream};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// CloudWatch Logs reports timestamps in epoch milliseconds.
const MILLIS_PER_SECOND: i64 = 1000;

/// AWS connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AwsSettings {
    /// Region override (e.g. "eu-west-1"); the SDK chain decides when unset.
    pub region: Option<String>,
    /// Shared config profile name.
    pub profile: Option<String>,
    /// Custom endpoint URL (useful for localstack testing).
    pub endpoint_url: Option<String>,
}

impl AwsSettings {
    /// Overlays the values set in `other` on top of `self`.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        if other.region.is_some() {
            self.region = other.region;
        }
        if other.profile.is_some() {
            self.profile = other.profile;
        }
        if other.endpoint_url.is_some() {
            self.endpoint_url = other.endpoint_url;
        }
        self
    }
}

/// CloudWatch Logs client backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct CloudWatchLogsClient {
    client: Client,
}

impl CloudWatchLogsClient {
    /// Loads the SDK configuration and builds a client.
    pub async fn from_settings(settings: &AwsSettings) -> Self {
        let mut sdk_config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &settings.region {
            sdk_config_builder = sdk_config_builder.region(aws_config::Region::new(region.clone()));
        }
        if let Some(profile) = &settings.profile {
            sdk_config_builder = sdk_config_builder.profile_name(profile);
        }

        let sdk_config = sdk_config_builder.load().await;

        let mut logs_config_builder = aws_sdk_cloudwatchlogs::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &settings.endpoint_url {
            logs_config_builder = logs_config_builder.endpoint_url(endpoint_url);
        }

        info!(
            region = ?sdk_config.region(),
            endpoint_url = ?settings.endpoint_url,
            "Initialized CloudWatch Logs client"
        );

        Self::new(Client::from_conf(logs_config_builder.build()))
    }

    /// Wraps an already configured SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Converts an SDK millisecond timestamp to seconds.
///
/// A missing timestamp is treated as "now" so the item is judged live.
fn to_seconds(millis: Option<i64>, now: i64) -> i64 {
    millis.map_or(now, |ms| ms / MILLIS_PER_SECOND)
}

/// Maps a listed log group, skipping it when it has no name.
fn group_ref(group: &LogGroup, now: i64) -> Option<LogGroupRef> {
    let Some(name) = group.log_group_name() else {
        debug!("Skipping log group without a name");
        return None;
    };
    Some(LogGroupRef {
        name: name.to_string(),
        arn: group.arn().unwrap_or(name).to_string(),
        creation_time: to_seconds(group.creation_time(), now),
    })
}

/// Maps a listed log stream of `group_name`, skipping it when it has no name.
fn stream_ref(group_name: &str, stream: &LogStream, now: i64) -> Option<LogStreamRef> {
    let Some(name) = stream.log_stream_name() else {
        debug!(log_group = group_name, "Skipping log stream without a name");
        return None;
    };
    Some(LogStreamRef {
        group_name: group_name.to_string(),
        stream_name: name.to_string(),
        creation_time: to_seconds(stream.creation_time(), now),
        last_event_timestamp: stream
            .last_event_timestamp()
            .map(|ms| ms / MILLIS_PER_SECOND),
    })
}

fn api_error<E>(operation: &'static str, resource: impl Into<String>, err: &E) -> Error
where
    E: std::error::Error,
{
    Error::Api {
        operation,
        resource: resource.into(),
        cause: DisplayErrorContext(err).to_string(),
    }
}

#[async_trait]
impl LogsApi for CloudWatchLogsClient {
    #[instrument(skip(self), fields(has_token = next_token.is_some()))]
    async fn describe_log_groups(&self, next_token: Option<String>) -> Result<Page<LogGroupRef>> {
        let output = self
            .client
            .describe_log_groups()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| api_error("DescribeLogGroups", "*", &e))?;

        let now = crate::current_timestamp();
        let items = output
            .log_groups()
            .iter()
            .filter_map(|group| group_ref(group, now))
            .collect();

        Ok(Page::new(items, output.next_token().map(str::to_string)))
    }

    #[instrument(skip(self), fields(has_token = next_token.is_some()))]
    async fn describe_log_streams(
        &self,
        group_name: &str,
        next_token: Option<String>,
    ) -> Result<Page<LogStreamRef>> {
        let output = self
            .client
            .describe_log_streams()
            .log_group_name(group_name)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| api_error("DescribeLogStreams", group_name, &e))?;

        let now = crate::current_timestamp();
        let items = output
            .log_streams()
            .iter()
            .filter_map(|stream| stream_ref(group_name, stream, now))
            .collect();

        Ok(Page::new(items, output.next_token().map(str::to_string)))
    }

    async fn delete_log_stream(&self, group_name: &str, stream_name: &str) -> Result<()> {
        self.client
            .delete_log_stream()
            .log_group_name(group_name)
            .log_stream_name(stream_name)
            .send()
            .await
            .map_err(|e| {
                api_error("DeleteLogStream", format!("{group_name}:{stream_name}"), &e)
            })?;
        Ok(())
    }

    async fn delete_log_group(&self, group_name: &str) -> Result<()> {
        self.client
            .delete_log_group()
            .log_group_name(group_name)
            .send()
            .await
            .map_err(|e| api_error("DeleteLogGroup", group_name, &e))?;
        Ok(())
    }
}
