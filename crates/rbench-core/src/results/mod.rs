use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::aggregator::EndpointStats;
use crate::plan::model::{CompositeId, WorkUnit};
use crate::telemetry::CorrelationSummary;

/// Status label for units that were never attempted.
pub const CANCELED_STATUS: &str = "canceled";

/// Substring marking a successful request in [`Record::status`].
const OK_MARKER: &str = "200";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Outcome of one dispatched work unit.
///
/// Written by the dispatcher (timing, status, size) and afterwards by the
/// telemetry correlator (correlated fields). Nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    pub id: CompositeId,
    pub timestamp: DateTime<Utc>,
    /// Endpoint URL without query suffix; the statistics grouping key.
    pub url: String,
    pub operation_id: Uuid,
    pub local_duration_ms: f64,
    /// `"<code>: <reason>"` on a response, otherwise the transport error text.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlated_operation_id: Option<String>,
    /// Server-side duration; zero until correlation succeeds.
    #[serde(default)]
    pub correlated_duration_ms: f64,
}

impl Record {
    /// Static column list for tabular sinks, matching [`Record::to_row`].
    pub const COLUMNS: [&'static str; 9] = [
        "id",
        "timestamp",
        "url",
        "operation_id",
        "local_duration_ms",
        "status",
        "size_bytes",
        "correlated_operation_id",
        "correlated_duration_ms",
    ];

    /// A record for `unit` with no outcome yet.
    pub fn for_unit(unit: &WorkUnit) -> Self {
        Self {
            id: unit.id,
            timestamp: Utc::now(),
            url: unit.endpoint_url.clone(),
            operation_id: unit.operation_id,
            local_duration_ms: 0.0,
            status: String::new(),
            size_bytes: None,
            correlated_operation_id: None,
            correlated_duration_ms: 0.0,
        }
    }

    pub fn canceled(unit: &WorkUnit) -> Self {
        Self {
            status: CANCELED_STATUS.to_string(),
            ..Self::for_unit(unit)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.contains(OK_MARKER)
    }

    pub fn is_correlated(&self) -> bool {
        self.correlated_operation_id.is_some()
    }

    /// Server-side duration when correlated, local timing otherwise.
    pub fn effective_duration_ms(&self) -> f64 {
        if self.is_correlated() {
            self.correlated_duration_ms
        } else {
            self.local_duration_ms
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.timestamp.to_rfc3339(),
            self.url.clone(),
            self.operation_id.to_string(),
            format!("{:.2}", self.local_duration_ms),
            self.status.clone(),
            self.size_bytes.map(|s| s.to_string()).unwrap_or_default(),
            self.correlated_operation_id.clone().unwrap_or_default(),
            format!("{:.2}", self.correlated_duration_ms),
        ]
    }
}

// ---------------------------------------------------------------------------
// BenchmarkReport
// ---------------------------------------------------------------------------

/// Everything a result sink receives for one benchmark pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchmarkReport {
    pub run_id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// In plan order.
    pub records: Vec<Record>,
    pub stats: Vec<EndpointStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<CorrelationSummary>,
}
