//! `cloudwatch` command handler.
//!
//! Resolves flags, environment and config file into a retention policy,
//! then runs one sweep against CloudWatch Logs.

use std::sync::Arc;

use aws_cleanup::cloudwatch::{AwsSettings, CloudWatchLogsClient};
use aws_cleanup::{CleanupConfig, SweepReport, Sweeper};
use clap::{Args, ValueEnum};
use tracing::info;

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One-line human-readable summary.
    #[default]
    Text,
    /// Full report as JSON.
    Json,
}

/// Arguments of the `cloudwatch` command.
///
/// Unset flags fall back to the config file, then to the built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct CloudwatchArgs {
    /// Log group to clean, or "all" for every log group.
    #[arg(long, env = "AWS_CLEANUP_LOGSGROUPNAME")]
    pub logsgroupname: Option<String>,

    /// Delete empty log groups created more than this many days ago.
    #[arg(long, env = "AWS_CLEANUP_DAYSLG", allow_negative_numbers = true)]
    pub dayslg: Option<i64>,

    /// Delete log streams inactive for more than this many days.
    #[arg(long, env = "AWS_CLEANUP_DAYSLS", allow_negative_numbers = true)]
    pub daysls: Option<i64>,

    /// AWS region.
    #[arg(long)]
    pub region: Option<String>,

    /// AWS shared config profile.
    #[arg(long)]
    pub profile: Option<String>,

    /// Custom CloudWatch Logs endpoint (e.g. localstack).
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Capacity of each deletion queue.
    #[arg(long, env = "AWS_CLEANUP_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Report output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl CloudwatchArgs {
    /// Overlays the flags that were set on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: CleanupConfig) -> CleanupConfig {
        if let Some(name) = &self.logsgroupname {
            config = config.with_log_group_name(name.clone());
        }
        if let Some(days) = self.dayslg {
            config = config.with_days_log_group(days);
        }
        if let Some(days) = self.daysls {
            config = config.with_days_log_stream(days);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        config.with_aws(AwsSettings {
            region: self.region.clone(),
            profile: self.profile.clone(),
            endpoint_url: self.endpoint_url.clone(),
        })
    }
}

/// Cloudwatch command implementation.
///
/// Deletes inactive log streams and empty, old log groups.
///
/// # Examples
///
/// ```bash
/// # Sweep every log group with the default 30/90 day retention
/// aws-cleanup cloudwatch
///
/// # Only look at one log group, keep streams for a week
/// aws-cleanup cloudwatch --logsgroupname /aws/lambda/my-fn --daysls 7
/// ```
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the sweep aborts.
/// Individual deletion failures are reported but are not errors.
pub async fn cmd_cloudwatch(
    args: CloudwatchArgs,
    config: CleanupConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = args.apply(config);
    let policy = config.retention_policy()?;

    info!(
        log_group = %policy.scope,
        days_log_group = policy.group_retention_days,
        days_log_stream = policy.stream_retention_days,
        "Starting CloudWatch cleanup"
    );

    let client = CloudWatchLogsClient::from_settings(&config.aws).await;
    let report = Sweeper::new(Arc::new(client), policy)
        .with_queue_capacity(config.queue_capacity)
        .run()
        .await?;

    print_report(&report, args.format)
}

fn print_report(
    report: &SweepReport,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Text => println!("{}", report.summary()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}
