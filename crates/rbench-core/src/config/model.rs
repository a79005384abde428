use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::RbenchError;

// ---------------------------------------------------------------------------
// AuthSettings
// ---------------------------------------------------------------------------

/// Where the bearer token for dispatched requests comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthSettings {
    /// Literal token value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Name of an environment variable holding the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

impl AuthSettings {
    /// Resolve the token, preferring the literal value over the environment.
    pub fn resolve_token(&self) -> Result<Option<String>, RbenchError> {
        resolve_secret(self.token.as_deref(), self.token_env.as_deref(), "auth.token_env")
    }
}

// ---------------------------------------------------------------------------
// TelemetrySettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelemetrySettings {
    /// Application Insights application id.
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Lookback window for the telemetry query, e.g. `30m`, `1h`, `2d`.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Maximum number of telemetry polls before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Overrides the public query endpoint (mainly for tests and proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl TelemetrySettings {
    pub fn resolve_api_key(&self) -> Result<Option<String>, RbenchError> {
        resolve_secret(
            self.api_key.as_deref(),
            self.api_key_env.as_deref(),
            "telemetry.api_key_env",
        )
    }
}

fn default_timeframe() -> String {
    "1h".to_string()
}

fn default_max_attempts() -> u32 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// SlaSettings
// ---------------------------------------------------------------------------

/// Presentation thresholds. They never influence computed statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SlaSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_kb: Option<f64>,
}

// ---------------------------------------------------------------------------
// BenchConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchConfig {
    #[serde(default)]
    pub name: String,
    /// Endpoint URLs; may contain `{name}` placeholders resolved from `url_args`.
    pub endpoints: Vec<String>,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Upper bound on in-flight requests. `None` dispatches every unit at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,
    #[serde(default)]
    pub url_args: HashMap<String, String>,
    /// Complete each request once headers arrive instead of reading the body.
    #[serde(default)]
    pub read_headers_only: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_details_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetrySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla: Option<SlaSettings>,
}

fn default_iterations() -> u32 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl BenchConfig {
    /// A minimal configuration hitting `endpoints` `iterations` times each.
    pub fn new(endpoints: Vec<String>, iterations: u32) -> Self {
        Self {
            name: String::new(),
            endpoints,
            iterations,
            max_parallel: None,
            url_args: HashMap::new(),
            read_headers_only: false,
            request_timeout_secs: default_request_timeout_secs(),
            auth: None,
            endpoint_details_file: None,
            telemetry: None,
            sla: None,
        }
    }
}

fn resolve_secret(
    literal: Option<&str>,
    env_name: Option<&str>,
    field: &str,
) -> Result<Option<String>, RbenchError> {
    if let Some(value) = literal {
        return Ok(Some(value.to_string()));
    }
    match env_name {
        Some(name) => std::env::var(name).map(Some).map_err(|_| {
            RbenchError::Configuration(format!(
                "{field}: environment variable '{name}' is not set"
            ))
        }),
        None => Ok(None),
    }
}
