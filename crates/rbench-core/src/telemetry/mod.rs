//! Server-side telemetry: the query capability and the correlator that binds
//! telemetry rows to dispatched requests.

pub mod app_insights;
pub mod correlator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RbenchError;

pub use app_insights::AppInsightsSource;
pub use correlator::{correlate, CorrelationOptions, CorrelationSummary, StopReason};

/// One server-recorded request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelemetryEntry {
    pub parent_operation_id: String,
    pub operation_id: String,
    pub duration_ms: f64,
}

/// Queries an external, eventually consistent telemetry store.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Return every entry recorded within `timeframe` whose parent operation
    /// id mentions any of `operation_ids`.
    async fn query(
        &self,
        operation_ids: &[String],
        timeframe: &str,
    ) -> Result<Vec<TelemetryEntry>, RbenchError>;
}
