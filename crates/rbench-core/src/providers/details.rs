use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::BenchConfig;
use crate::error::RbenchError;
use crate::plan::model::EndpointDetail;
use crate::providers::EndpointDetailProvider;

/// Reads a JSON array of [`EndpointDetail`] from disk on every call.
pub struct JsonFileDetailProvider {
    path: PathBuf,
}

impl JsonFileDetailProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EndpointDetailProvider for JsonFileDetailProvider {
    async fn get_details(&self, _config: &BenchConfig) -> Result<Vec<EndpointDetail>, RbenchError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RbenchError::Provider(format!(
                "Failed to read endpoint details from {}: {e}",
                self.path.display()
            ))
        })?;
        let details: Vec<EndpointDetail> = serde_json::from_str(&content)?;
        Ok(details)
    }
}

/// In-memory details, mostly useful for embedding and tests.
pub struct StaticDetailProvider {
    details: Vec<EndpointDetail>,
}

impl StaticDetailProvider {
    pub fn new(details: Vec<EndpointDetail>) -> Self {
        Self { details }
    }
}

#[async_trait]
impl EndpointDetailProvider for StaticDetailProvider {
    async fn get_details(&self, _config: &BenchConfig) -> Result<Vec<EndpointDetail>, RbenchError> {
        Ok(self.details.clone())
    }
}

/// No metadata source configured.
pub struct NoDetails;

#[async_trait]
impl EndpointDetailProvider for NoDetails {
    async fn get_details(&self, _config: &BenchConfig) -> Result<Vec<EndpointDetail>, RbenchError> {
        Err(RbenchError::NotImplemented(
            "no endpoint detail provider configured".to_string(),
        ))
    }
}
