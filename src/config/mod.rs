//! Configuration management.
//!
//! Settings come from, highest precedence first: CLI flags and their
//! environment variables (resolved by the binary), a config file, and the
//! built-in defaults below. Config files are TOML, or YAML when the file
//! extension is `.yaml`/`.yml`.
//!
//! ```toml
//! [cloudwatch]
//! log_group_name = "all"
//! days_log_group = 90
//! days_log_stream = 30
//!
//! [aws]
//! region = "eu-west-1"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use crate::cloudwatch::AwsSettings;
use crate::models::{
    ALL_GROUPS, DEFAULT_GROUP_RETENTION_DAYS, DEFAULT_STREAM_RETENTION_DAYS, GroupScope,
    RetentionPolicy,
};
use crate::sweep::DEFAULT_QUEUE_CAPACITY;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "AWS_CLEANUP_CONFIG_PATH";

/// Main configuration for aws-cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupConfig {
    /// Log group filter, [`ALL_GROUPS`] for every group.
    pub log_group_name: String,
    /// Retention for empty log groups, in days since creation.
    pub days_log_group: i64,
    /// Retention for log streams, in days since last activity.
    pub days_log_stream: i64,
    /// Capacity of each candidate queue.
    pub queue_capacity: usize,
    /// AWS connection settings.
    pub aws: AwsSettings,
    /// Logging/metrics settings.
    pub observability: ObservabilitySettings,
    /// File this configuration was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            log_group_name: ALL_GROUPS.to_string(),
            days_log_group: DEFAULT_GROUP_RETENTION_DAYS,
            days_log_stream: DEFAULT_STREAM_RETENTION_DAYS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            aws: AwsSettings::default(),
            observability: ObservabilitySettings::default(),
            source: None,
        }
    }
}

/// Observability settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging section in config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Level or `EnvFilter` directive, e.g. "debug" or "`aws_cleanup=debug`".
    pub level: Option<String>,
    /// Output format: "pretty" or "json".
    pub format: Option<String>,
    /// Append log lines to this file instead of stderr.
    pub file: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetricsSettings {
    /// Whether metrics are recorded.
    pub enabled: Option<bool>,
    /// Push gateway receiving the metrics at the end of the run.
    pub push_gateway: Option<MetricsPushGatewaySettings>,
}

/// Push gateway section in config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetricsPushGatewaySettings {
    /// Push gateway endpoint, including the job path.
    pub endpoint: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Use POST instead of PUT.
    pub use_http_post: Option<bool>,
}

/// A default-location config file that failed to load and was skipped.
#[derive(Debug)]
pub struct SkippedConfigFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Why it could not be loaded.
    pub error: Error,
}

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// CloudWatch sweep settings.
    pub cloudwatch: Option<ConfigFileCloudwatch>,
    /// AWS connection settings.
    pub aws: Option<AwsSettings>,
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Cloudwatch section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCloudwatch {
    /// Log group filter.
    pub log_group_name: Option<String>,
    /// Group retention days.
    pub days_log_group: Option<i64>,
    /// Stream retention days.
    pub days_log_stream: Option<i64>,
    /// Queue capacity.
    pub queue_capacity: Option<usize>,
}

impl CleanupConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = if is_yaml(path) {
            serde_yaml_ng::from_str(&contents).map_err(|e| Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?
        } else {
            toml::from_str(&contents).map_err(|e| Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?
        };

        let mut config = Self::from_config_file(file);
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Loads configuration from the default locations.
    ///
    /// Checks the following paths in order and uses the first that loads:
    /// 1. `~/.aws-cleanup.yaml`
    /// 2. `~/.aws-cleanup.toml`
    /// 3. Platform config dir (`~/.config/aws-cleanup/config.toml` on Linux)
    ///
    /// Returns default configuration if no config file loads. Files that
    /// exist but fail to load are returned alongside it; logging is usually
    /// not initialized yet, so the caller reports them.
    #[must_use]
    pub fn load_default() -> (Self, Vec<SkippedConfigFile>) {
        Self::load_first_of(&default_paths())
    }

    fn load_first_of(paths: &[PathBuf]) -> (Self, Vec<SkippedConfigFile>) {
        let mut skipped = Vec::new();
        for path in paths.iter().filter(|path| path.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return (config, skipped),
                Err(error) => skipped.push(SkippedConfigFile {
                    path: path.clone(),
                    error,
                }),
            }
        }
        (Self::default(), skipped)
    }

    /// Loads configuration from `path` if given, else from
    /// [`CONFIG_PATH_ENV`], else from the default locations.
    ///
    /// The skipped list is only non-empty for the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<(Self, Vec<SkippedConfigFile>)> {
        if let Some(path) = path {
            return Ok((Self::load_from_file(path)?, Vec::new()));
        }

        if let Ok(env_path) = std::env::var(CONFIG_PATH_ENV)
            && !env_path.trim().is_empty()
        {
            return Ok((Self::load_from_file(Path::new(env_path.trim()))?, Vec::new()));
        }

        Ok(Self::load_default())
    }

    /// Converts a `ConfigFile` to `CleanupConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(cloudwatch) = file.cloudwatch {
            if let Some(name) = cloudwatch.log_group_name {
                config.log_group_name = name;
            }
            if let Some(days) = cloudwatch.days_log_group {
                config.days_log_group = days;
            }
            if let Some(days) = cloudwatch.days_log_stream {
                config.days_log_stream = days;
            }
            if let Some(capacity) = cloudwatch.queue_capacity {
                config.queue_capacity = capacity;
            }
        }
        if let Some(aws) = file.aws {
            config.aws = aws;
        }
        config.observability = ObservabilitySettings {
            logging: file.logging,
            metrics: file.metrics,
        };

        config
    }

    /// Sets the log group filter.
    #[must_use]
    pub fn with_log_group_name(mut self, name: impl Into<String>) -> Self {
        self.log_group_name = name.into();
        self
    }

    /// Sets the group retention.
    #[must_use]
    pub const fn with_days_log_group(mut self, days: i64) -> Self {
        self.days_log_group = days;
        self
    }

    /// Sets the stream retention.
    #[must_use]
    pub const fn with_days_log_stream(mut self, days: i64) -> Self {
        self.days_log_stream = days;
        self
    }

    /// Sets the candidate queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Overlays AWS settings.
    #[must_use]
    pub fn with_aws(mut self, aws: AwsSettings) -> Self {
        self.aws = self.aws.merge(aws);
        self
    }

    /// Builds the retention policy for a sweep.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the log group filter is empty.
    pub fn retention_policy(&self) -> Result<RetentionPolicy> {
        Ok(RetentionPolicy::new(
            self.days_log_stream,
            self.days_log_group,
            GroupScope::parse(&self.log_group_name)?,
        ))
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

fn default_paths() -> Vec<PathBuf> {
    let Some(base_dirs) = directories::BaseDirs::new() else {
        return Vec::new();
    };

    vec![
        base_dirs.home_dir().join(".aws-cleanup.yaml"),
        base_dirs.home_dir().join(".aws-cleanup.toml"),
        base_dirs.config_dir().join("aws-cleanup").join("config.toml"),
    ]
}
