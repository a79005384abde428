use async_trait::async_trait;

use crate::config::BenchConfig;
use crate::error::RbenchError;
use crate::providers::AuthProvider;

/// Returns a token fixed at construction time.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Build from the configuration's `auth` section. `None` when the
    /// configuration carries no token source.
    pub fn from_config(config: &BenchConfig) -> Result<Option<Self>, RbenchError> {
        let token = match &config.auth {
            Some(auth) => auth.resolve_token()?,
            None => None,
        };
        Ok(token.map(Self::new))
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn get_token(&self, _config: &BenchConfig) -> Result<String, RbenchError> {
        Ok(self.token.clone())
    }
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait]
impl AuthProvider for NoAuth {
    async fn get_token(&self, _config: &BenchConfig) -> Result<String, RbenchError> {
        Ok(String::new())
    }
}
