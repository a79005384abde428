use crate::config::model::{BenchConfig, TelemetrySettings};
use crate::error::RbenchError;
use crate::plan::placeholders::format_url;

/// Validate a [`BenchConfig`] and return every problem found.
///
/// An empty `Vec` means the configuration is usable.
pub fn validate_config(config: &BenchConfig) -> Vec<RbenchError> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(RbenchError::Configuration(
            "At least one endpoint is required".to_string(),
        ));
    }

    if config.iterations == 0 {
        errors.push(RbenchError::Configuration(
            "iterations must be at least 1".to_string(),
        ));
    }

    if config.max_parallel == Some(0) {
        errors.push(RbenchError::Configuration(
            "max_parallel must be at least 1 when set".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        errors.push(RbenchError::Configuration(
            "request_timeout_secs must be at least 1".to_string(),
        ));
    }

    for endpoint in &config.endpoints {
        errors.extend(validate_endpoint(endpoint, config));
    }

    if let Some(telemetry) = &config.telemetry {
        errors.extend(validate_telemetry(telemetry));
    }

    errors
}

fn validate_endpoint(endpoint: &str, config: &BenchConfig) -> Vec<RbenchError> {
    let mut errors = Vec::new();

    if endpoint.trim().is_empty() {
        errors.push(RbenchError::Configuration(
            "Endpoint URL must not be empty".to_string(),
        ));
        return errors;
    }

    match format_url(endpoint, &config.url_args) {
        Ok(url) => {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(RbenchError::Configuration(format!(
                    "Endpoint URL must start with http:// or https:// (got: {url})"
                )));
            }
        }
        Err(e) => errors.push(e),
    }

    errors
}

fn validate_telemetry(telemetry: &TelemetrySettings) -> Vec<RbenchError> {
    let mut errors = Vec::new();

    if telemetry.app_id.trim().is_empty() {
        errors.push(RbenchError::Configuration(
            "telemetry.app_id must not be empty".to_string(),
        ));
    }

    if telemetry.api_key.is_none() && telemetry.api_key_env.is_none() {
        errors.push(RbenchError::Configuration(
            "telemetry requires api_key or api_key_env".to_string(),
        ));
    }

    if !is_valid_timeframe(&telemetry.timeframe) {
        errors.push(RbenchError::Configuration(format!(
            "telemetry.timeframe must look like 30m, 1h or 2d (got: {})",
            telemetry.timeframe
        )));
    }

    if telemetry.max_attempts == 0 {
        errors.push(RbenchError::Configuration(
            "telemetry.max_attempts must be at least 1".to_string(),
        ));
    }

    errors
}

/// `<digits><m|h|d>`, the subset of Kusto timespan literals accepted by `ago()`.
pub fn is_valid_timeframe(timeframe: &str) -> bool {
    let Some(unit) = timeframe.chars().last() else {
        return false;
    };
    let digits = &timeframe[..timeframe.len() - unit.len_utf8()];
    matches!(unit, 'm' | 'h' | 'd')
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
}
