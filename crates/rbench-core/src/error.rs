use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RbenchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The capability is not provided by the configured implementation.
    /// Callers that can fall back to defaults match on this variant.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Telemetry query error: {0}")]
    CorrelationQuery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RbenchError {
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, RbenchError::NotImplemented(_))
    }
}

impl Serialize for RbenchError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
