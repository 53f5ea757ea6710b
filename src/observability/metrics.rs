//! Prometheus metrics.
//!
//! A sweep is a short-lived process, so metrics are never scraped. When
//! enabled they are recorded in-process and pushed to a Prometheus push
//! gateway once, at shutdown.

use super::{parse_bool_env, parse_string_env};
use crate::config::{MetricsPushGatewaySettings, MetricsSettings};
use crate::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use std::thread;
use std::time::Duration;

const PUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Push gateway configuration.
#[derive(Debug, Clone)]
pub struct PushGatewayConfig {
    /// Push gateway endpoint URI, including the job path.
    pub endpoint: String,
    /// Optional username for basic auth.
    pub username: Option<String>,
    /// Optional password for basic auth.
    pub password: Option<SecretString>,
    /// Whether to use HTTP POST instead of PUT.
    pub use_http_post: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Whether metrics are recorded.
    pub enabled: bool,
    /// Where metrics are pushed at shutdown.
    pub push_gateway: Option<PushGatewayConfig>,
}

impl MetricsConfig {
    /// Builds metrics configuration from config settings with env overrides.
    ///
    /// `AWS_CLEANUP_METRICS_ENABLED` and the
    /// `AWS_CLEANUP_METRICS_PUSH_GATEWAY_*` variables win over the file.
    #[must_use]
    pub fn from_settings(settings: Option<&MetricsSettings>) -> Self {
        let mut config = Self {
            enabled: settings.and_then(|s| s.enabled).unwrap_or(false),
            push_gateway: settings
                .and_then(|s| s.push_gateway.as_ref())
                .and_then(parse_push_gateway_settings),
        };

        if let Some(enabled) = parse_bool_env("AWS_CLEANUP_METRICS_ENABLED") {
            config.enabled = enabled;
        }
        apply_push_gateway_env_overrides(&mut config);

        config
    }
}

/// Metrics handle for flushing on shutdown.
#[derive(Debug)]
pub struct MetricsHandle {
    prometheus: PrometheusHandle,
    push_gateway: Option<PushGatewayConfig>,
}

impl MetricsHandle {
    /// Renders the current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.prometheus.render()
    }
}

/// Installs the global Prometheus recorder.
///
/// Returns `None` when metrics are disabled; the `metrics` macros are no-ops
/// without a recorder.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_prometheus(config: &MetricsConfig) -> Result<Option<MetricsHandle>> {
    if !config.enabled {
        return Ok(None);
    }

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::OperationFailed {
            operation: "metrics_recorder_install".to_string(),
            cause: e.to_string(),
        })?;

    Ok(Some(MetricsHandle {
        prometheus,
        push_gateway: config.push_gateway.clone(),
    }))
}

/// Pushes the recorded metrics to the push gateway, if configured.
///
/// `reqwest::blocking` must not run on a runtime thread, so inside a tokio
/// runtime the push happens on a helper thread that is joined before
/// returning.
pub fn flush(handle: &MetricsHandle) {
    let Some(push_gateway) = handle.push_gateway.clone() else {
        tracing::debug!("No push gateway configured, skipping flush");
        return;
    };

    let mut payload = handle.render();
    // push gateway rejects payloads without a trailing newline
    if !payload.ends_with('\n') {
        payload.push('\n');
    }

    tracing::debug!(
        bytes = payload.len(),
        endpoint = %push_gateway.endpoint,
        "Pushing metrics to push gateway"
    );

    if tokio::runtime::Handle::try_current().is_ok() {
        let pusher = thread::spawn(move || push_to_gateway(&push_gateway, payload));
        if pusher.join().is_err() {
            tracing::warn!("Metrics push thread panicked");
        }
    } else {
        push_to_gateway(&push_gateway, payload);
    }
}

fn push_to_gateway(gateway: &PushGatewayConfig, payload: String) {
    let client = Client::new();
    let request = if gateway.use_http_post {
        client.post(&gateway.endpoint)
    } else {
        client.put(&gateway.endpoint)
    };

    let request = match &gateway.username {
        Some(username) => request.basic_auth(
            username,
            gateway
                .password
                .as_ref()
                .map(|password| password.expose_secret().to_string()),
        ),
        None => request,
    };

    let response = request
        .header(CONTENT_TYPE, "text/plain; version=0.0.4")
        .timeout(PUSH_TIMEOUT)
        .body(payload)
        .send();

    match response {
        Ok(resp) if resp.status().is_success() => {
            tracing::debug!(status = %resp.status(), "Metrics pushed");
        },
        Ok(resp) => {
            tracing::warn!(status = %resp.status(), "Metrics push rejected");
        },
        Err(err) => {
            tracing::warn!("Failed to push metrics: {err}");
        },
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_push_gateway_settings(settings: &MetricsPushGatewaySettings) -> Option<PushGatewayConfig> {
    Some(PushGatewayConfig {
        endpoint: non_empty(settings.endpoint.as_ref())?,
        username: non_empty(settings.username.as_ref()),
        password: non_empty(settings.password.as_ref()).map(SecretString::from),
        // one push per run, PUT replaces the previous run's group
        use_http_post: settings.use_http_post.unwrap_or(false),
    })
}

fn apply_push_gateway_env_overrides(config: &mut MetricsConfig) {
    let endpoint = parse_string_env("AWS_CLEANUP_METRICS_PUSH_GATEWAY_ENDPOINT");
    let username = parse_string_env("AWS_CLEANUP_METRICS_PUSH_GATEWAY_USERNAME");
    let password = parse_string_env("AWS_CLEANUP_METRICS_PUSH_GATEWAY_PASSWORD");
    let use_http_post = parse_bool_env("AWS_CLEANUP_METRICS_PUSH_GATEWAY_USE_POST");

    if endpoint.is_none() && username.is_none() && password.is_none() && use_http_post.is_none() {
        return;
    }

    let mut current = config.push_gateway.clone().unwrap_or(PushGatewayConfig {
        endpoint: String::new(),
        username: None,
        password: None,
        use_http_post: false,
    });

    if let Some(endpoint) = endpoint {
        current.endpoint = endpoint;
    }
    if username.is_some() {
        current.username = username;
    }
    if let Some(password) = password {
        current.password = Some(SecretString::from(password));
    }
    if let Some(use_http_post) = use_http_post {
        current.use_http_post = use_http_post;
    }

    if !current.endpoint.is_empty() {
        config.push_gateway = Some(current);
    }
}
