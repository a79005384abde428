//! Capabilities the benchmark consumes but does not own: bearer-token
//! acquisition and per-endpoint request metadata. Implementations are chosen
//! by the embedding application and injected as trait objects.

pub mod auth;
pub mod details;

use async_trait::async_trait;

use crate::config::BenchConfig;
use crate::error::RbenchError;
use crate::plan::model::EndpointDetail;

pub use auth::{NoAuth, StaticTokenProvider};
pub use details::{JsonFileDetailProvider, NoDetails, StaticDetailProvider};

/// Supplies the bearer token injected into every dispatched request.
///
/// An empty token means "send no Authorization header".
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_token(&self, config: &BenchConfig) -> Result<String, RbenchError>;
}

/// Supplies request metadata for the configured endpoints.
///
/// Implementations that have nothing to offer return
/// [`RbenchError::NotImplemented`]; the planner then falls back to plain GETs.
#[async_trait]
pub trait EndpointDetailProvider: Send + Sync {
    async fn get_details(&self, config: &BenchConfig) -> Result<Vec<EndpointDetail>, RbenchError>;
}
