use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::TelemetrySettings;
use crate::error::RbenchError;
use crate::http::dispatcher::error_label;
use crate::telemetry::{TelemetryEntry, TelemetrySource};

pub const DEFAULT_BASE_URL: &str = "https://api.applicationinsights.io";

const PARENT_ID_COLUMN: &str = "operation_ParentId";
const OPERATION_ID_COLUMN: &str = "operation_Id";
const DURATION_COLUMN: &str = "duration";

/// Application Insights REST query API (`/v1/apps/{app}/query`), keyed by an
/// API key.
pub struct AppInsightsSource {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    tables: Vec<QueryTable>,
}

#[derive(Debug, Deserialize)]
struct QueryTable {
    columns: Vec<QueryColumn>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct QueryColumn {
    name: String,
}

impl AppInsightsSource {
    pub fn new(
        client: reqwest::Client,
        app_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build from configuration. `None` when no API key can be resolved,
    /// in which case correlation must not run.
    pub fn from_settings(
        client: reqwest::Client,
        settings: &TelemetrySettings,
    ) -> Result<Option<Self>, RbenchError> {
        let Some(api_key) = settings.resolve_api_key()? else {
            return Ok(None);
        };
        let mut source = Self::new(client, settings.app_id.clone(), api_key);
        if let Some(base_url) = &settings.base_url {
            source = source.with_base_url(base_url.clone());
        }
        Ok(Some(source))
    }

    fn query_url(&self) -> String {
        format!("{}/v1/apps/{}/query", self.base_url, self.app_id)
    }
}

/// Kusto query selecting request rows whose parent id mentions any of `ids`.
pub fn build_query(operation_ids: &[String], timeframe: &str) -> String {
    let filter = operation_ids
        .iter()
        .map(|id| format!("{PARENT_ID_COLUMN} contains \"{}\"", escape_kusto(id)))
        .collect::<Vec<_>>()
        .join(" or ");

    format!(
        "requests | where timestamp > ago({timeframe}) | where {filter} \
         | project {PARENT_ID_COLUMN}, {OPERATION_ID_COLUMN}, {DURATION_COLUMN}"
    )
}

fn escape_kusto(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn parse_entries(response: QueryResponse) -> Result<Vec<TelemetryEntry>, RbenchError> {
    let Some(table) = response.tables.into_iter().next() else {
        return Ok(Vec::new());
    };

    let column = |name: &str| {
        table
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                RbenchError::CorrelationQuery(format!("Query result lacks column '{name}'"))
            })
    };
    let parent_idx = column(PARENT_ID_COLUMN)?;
    let op_idx = column(OPERATION_ID_COLUMN)?;
    let duration_idx = column(DURATION_COLUMN)?;

    let entries = table
        .rows
        .iter()
        .filter_map(|row| {
            Some(TelemetryEntry {
                parent_operation_id: row.get(parent_idx)?.as_str()?.to_string(),
                operation_id: row.get(op_idx)?.as_str()?.to_string(),
                duration_ms: row.get(duration_idx)?.as_f64()?,
            })
        })
        .collect();
    Ok(entries)
}

#[async_trait]
impl TelemetrySource for AppInsightsSource {
    async fn query(
        &self,
        operation_ids: &[String],
        timeframe: &str,
    ) -> Result<Vec<TelemetryEntry>, RbenchError> {
        if operation_ids.is_empty() {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({ "query": build_query(operation_ids, timeframe) });
        let response = self
            .client
            .post(self.query_url())
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RbenchError::CorrelationQuery(error_label(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(RbenchError::CorrelationQuery(format!("{status}: {text}")));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RbenchError::CorrelationQuery(error_label(&e)))?;
        parse_entries(parsed)
    }
}
