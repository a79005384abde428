use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{validate_config, BenchConfig};
use crate::engine::aggregator::aggregate;
use crate::engine::runner::run;
use crate::error::RbenchError;
use crate::http::client::HttpClientBuilder;
use crate::http::dispatcher::RequestDispatcher;
use crate::plan::plan;
use crate::providers::{
    AuthProvider, EndpointDetailProvider, JsonFileDetailProvider, NoAuth, NoDetails,
    StaticTokenProvider,
};
use crate::results::BenchmarkReport;
use crate::telemetry::{correlate, AppInsightsSource, CorrelationOptions, TelemetrySource};

/// The external capabilities a benchmark pass consumes.
pub struct Providers {
    pub auth: Arc<dyn AuthProvider>,
    pub details: Arc<dyn EndpointDetailProvider>,
    /// `None` disables correlation even when telemetry settings exist.
    pub telemetry: Option<Arc<dyn TelemetrySource>>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            auth: Arc::new(NoAuth),
            details: Arc::new(NoDetails),
            telemetry: None,
        }
    }
}

impl Providers {
    /// Stock providers for a configuration: a static token, a JSON details
    /// file and Application Insights, each only when configured.
    pub fn from_config(config: &BenchConfig) -> Result<Self, RbenchError> {
        let mut providers = Self::default();

        if let Some(auth) = StaticTokenProvider::from_config(config)? {
            providers.auth = Arc::new(auth);
        }

        if let Some(path) = &config.endpoint_details_file {
            providers.details = Arc::new(JsonFileDetailProvider::new(path));
        }

        if let Some(settings) = &config.telemetry {
            let client = HttpClientBuilder::new().build()?;
            if let Some(source) = AppInsightsSource::from_settings(client, settings)? {
                providers.telemetry = Some(Arc::new(source));
            }
        }

        Ok(providers)
    }
}

/// Run one benchmark pass: plan, dispatch, correlate, aggregate.
///
/// Configuration and provider failures abort before any request is sent.
/// Request failures end up in the records; telemetry failures only leave
/// correlated fields empty.
pub async fn run_benchmark(
    config: &BenchConfig,
    providers: &Providers,
    cancel: CancellationToken,
) -> Result<BenchmarkReport, RbenchError> {
    let errors = validate_config(config);
    if !errors.is_empty() {
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(RbenchError::Configuration(message));
    }

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    tracing::info!(%run_id, name = %config.name, "Starting benchmark");

    let token = providers.auth.get_token(config).await?;
    let units = plan(config, providers.details.as_ref()).await?;

    let client = HttpClientBuilder::for_benchmark(config).build()?;
    let dispatcher = Arc::new(RequestDispatcher::new(client, token, config.read_headers_only));

    let mut records = run(units, dispatcher, config.max_parallel, cancel.clone()).await;

    // Correlation starts only after every dispatch has finished.
    let correlation = match (&config.telemetry, &providers.telemetry) {
        (Some(settings), Some(source)) if !cancel.is_cancelled() => {
            let options = CorrelationOptions::from(settings);
            Some(correlate(&mut records, source.as_ref(), &options, &cancel).await?)
        }
        _ => None,
    };

    let stats = aggregate(&records);
    let finished_at = Utc::now();
    tracing::info!(%run_id, records = records.len(), groups = stats.len(), "Benchmark finished");

    Ok(BenchmarkReport {
        run_id,
        name: config.name.clone(),
        started_at,
        finished_at,
        records,
        stats,
        correlation,
    })
}
