use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::RbenchError;

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        write!(f, "{s}")
    }
}

impl FromStr for HttpMethod {
    type Err = RbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(RbenchError::Configuration(format!(
                "Unsupported HTTP method: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// EndpointDetail: raw provider output
// ---------------------------------------------------------------------------

/// Request metadata for one endpoint as returned by an
/// [`EndpointDetailProvider`](crate::providers::EndpointDetailProvider).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointDetail {
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Ordered `(name, value)` pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// `"<content-type>:<body text>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Appended verbatim to the endpoint URL, e.g. `?page=2`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

// ---------------------------------------------------------------------------
// RequestDetail: resolved, attached to a work unit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestBody {
    pub content_type: String,
    pub text: String,
}

impl RequestBody {
    /// Split `"<content-type>:<text>"` at the first colon. Returns `None`
    /// unless both the content type and the text are present.
    pub fn parse(raw: &str) -> Option<Self> {
        let (content_type, text) = raw.split_once(':')?;
        let content_type = content_type.trim();
        if content_type.is_empty() || text.is_empty() {
            return None;
        }
        Some(Self {
            content_type: content_type.to_string(),
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestDetail {
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
    #[serde(default)]
    pub query: String,
}

impl RequestDetail {
    /// Case-insensitive header lookup; the first matching entry wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

impl From<&EndpointDetail> for RequestDetail {
    fn from(detail: &EndpointDetail) -> Self {
        Self {
            method: detail.method.clone(),
            headers: detail.headers.clone(),
            body: detail.body.as_deref().and_then(RequestBody::parse),
            query: detail.query.clone().unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// CompositeId
// ---------------------------------------------------------------------------

/// `"<group>.<iteration>"`, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeId {
    pub group: u32,
    pub iteration: u32,
}

impl CompositeId {
    pub fn new(group: u32, iteration: u32) -> Self {
        Self { group, iteration }
    }
}

impl std::fmt::Display for CompositeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.group, self.iteration)
    }
}

impl FromStr for CompositeId {
    type Err = RbenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RbenchError::Internal(format!("Invalid composite id: {s}"));
        let (group, iteration) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self {
            group: group.parse().map_err(|_| invalid())?,
            iteration: iteration.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for CompositeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CompositeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// WorkUnit
// ---------------------------------------------------------------------------

/// One planned request. Immutable once planned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkUnit {
    pub id: CompositeId,
    pub operation_id: Uuid,
    /// Endpoint URL after placeholder substitution, without the query suffix.
    pub endpoint_url: String,
    pub detail: RequestDetail,
}

impl WorkUnit {
    /// The URL actually requested: endpoint plus the detail's query suffix.
    pub fn request_url(&self) -> String {
        format!("{}{}", self.endpoint_url, self.detail.query)
    }
}
