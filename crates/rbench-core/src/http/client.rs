use std::time::Duration;

use crate::config::BenchConfig;
use crate::error::RbenchError;

/// Idle connections kept per host when the run has no concurrency bound.
const UNBOUNDED_IDLE_PER_HOST: usize = 100;

/// Builds the [`reqwest::Client`] a benchmark pass shares across all of its
/// requests, so connections are pooled instead of reopened per request.
///
/// Response decompression stays off: the dispatcher reports the
/// `Content-Length` as sent on the wire.
#[derive(Debug, Clone)]
pub struct HttpClientBuilder {
    timeout: Duration,
    idle_per_host: usize,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            idle_per_host: UNBOUNDED_IDLE_PER_HOST,
            user_agent: format!("rbench/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for dispatching a configured benchmark: the configured
    /// request timeout, and an idle pool no larger than the concurrency bound.
    pub fn for_benchmark(config: &BenchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            idle_per_host: config.max_parallel.unwrap_or(UNBOUNDED_IDLE_PER_HOST),
            ..Self::default()
        }
    }

    /// Per-request timeout. Also bounds requests still in flight when a run
    /// is cancelled.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<reqwest::Client, RbenchError> {
        Ok(reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.idle_per_host)
            .user_agent(self.user_agent)
            .build()?)
    }
}
