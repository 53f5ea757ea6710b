//! Structured logging configuration.

use super::{parse_bool_env, parse_string_env};
use crate::config::LoggingSettings;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "info";
const DEBUG_LEVEL: &str = "debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Level filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
}

impl Clone for LoggingConfig {
    fn clone(&self) -> Self {
        Self {
            filter: EnvFilter::new(self.filter.to_string()),
            format: self.format,
            file: self.file.clone(),
        }
    }
}

impl LoggingConfig {
    /// Builds logging configuration from config settings with env overrides.
    ///
    /// Level precedence: `RUST_LOG`, then `AWS_CLEANUP_LOG`, then `debug`
    /// when `--debug` or `AWS_CLEANUP_DEBUG` is set, then the config file,
    /// then `info`. `AWS_CLEANUP_LOG_FORMAT` and `AWS_CLEANUP_LOG_FILE`
    /// override the file's format and destination.
    #[must_use]
    #[allow(clippy::print_stderr)]
    pub fn from_settings(settings: Option<&LoggingSettings>, debug: bool) -> Self {
        let debug = debug || parse_bool_env("AWS_CLEANUP_DEBUG").unwrap_or(false);
        let directive = parse_string_env("RUST_LOG")
            .or_else(|| parse_string_env("AWS_CLEANUP_LOG"))
            .or_else(|| debug.then(|| DEBUG_LEVEL.to_string()))
            .or_else(|| settings.and_then(|s| s.level.clone()))
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

        let format = parse_string_env("AWS_CLEANUP_LOG_FORMAT")
            .or_else(|| settings.and_then(|s| s.format.clone()))
            .map(|value| {
                value.parse::<LogFormat>().unwrap_or_else(|e| {
                    eprintln!("{e}, using pretty");
                    LogFormat::Pretty
                })
            })
            .unwrap_or_default();

        let file = parse_string_env("AWS_CLEANUP_LOG_FILE")
            .or_else(|| settings.and_then(|s| s.file.clone()))
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self {
            filter: build_filter(&directive),
            format,
            file,
        }
    }
}

// Runs before any subscriber is installed.
#[allow(clippy::print_stderr)]
fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{directive}': {e}, using {DEFAULT_LEVEL}");
        EnvFilter::new(DEFAULT_LEVEL)
    })
}
