use std::error::Error;
use std::iter::successors;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;

use crate::plan::model::WorkUnit;
use crate::results::Record;

/// Correlation header carrying the unit's operation id.
pub const REQUEST_ID_HEADER: &str = "Request-Id";

/// Executes one work unit and reports its outcome as a [`Record`].
///
/// Implementations must never fail: every outcome, including transport
/// errors, is folded into the returned record.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, unit: &WorkUnit, cancel: &CancellationToken) -> Record;
}

/// Sends work units over HTTP with a shared [`reqwest::Client`].
pub struct RequestDispatcher {
    client: reqwest::Client,
    token: String,
    read_headers_only: bool,
}

/// Status and advertised size of a response.
struct ResponseOutcome {
    status: reqwest::StatusCode,
    content_length: Option<u64>,
}

impl RequestDispatcher {
    /// `token` may be empty, in which case no Authorization header is added.
    pub fn new(client: reqwest::Client, token: impl Into<String>, read_headers_only: bool) -> Self {
        Self {
            client,
            token: token.into(),
            read_headers_only,
        }
    }

    /// Value sent in the `Request-Id` header: the hierarchical form
    /// `|<operation id>.` that servers record as the parent operation id.
    pub fn request_id_value(unit: &WorkUnit) -> String {
        format!("|{}.", unit.operation_id)
    }

    fn build_request(&self, unit: &WorkUnit) -> reqwest::RequestBuilder {
        let detail = &unit.detail;
        let mut builder = self
            .client
            .request(detail.method.as_reqwest(), unit.request_url());

        if !detail.has_header(REQUEST_ID_HEADER) {
            builder = builder.header(REQUEST_ID_HEADER, Self::request_id_value(unit));
        }
        if !self.token.is_empty() && !detail.has_header(AUTHORIZATION.as_str()) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", self.token));
        }

        if let Some(body) = &detail.body {
            if !detail.has_header(CONTENT_TYPE.as_str()) {
                builder = builder.header(CONTENT_TYPE, body.content_type.as_str());
            }
            builder = builder.body(body.text.clone());
        }

        // Explicit headers go out verbatim and take precedence.
        for (name, value) in &detail.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<ResponseOutcome, reqwest::Error> {
        let response = builder.send().await?;
        let status = response.status();
        let content_length = response.content_length();

        if !self.read_headers_only {
            response.bytes().await?;
        }

        Ok(ResponseOutcome {
            status,
            content_length,
        })
    }
}

#[async_trait]
impl Dispatcher for RequestDispatcher {
    async fn dispatch(&self, unit: &WorkUnit, cancel: &CancellationToken) -> Record {
        if cancel.is_cancelled() {
            return Record::canceled(unit);
        }

        let mut record = Record::for_unit(unit);
        let builder = self.build_request(unit);

        let start = Instant::now();
        let result = self.execute(builder).await;
        record.local_duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(outcome) => {
                record.status = status_label(outcome.status);
                record.size_bytes = outcome.content_length;
            }
            Err(e) => {
                record.status = error_label(&e);
            }
        }

        tracing::debug!(
            id = %record.id,
            url = %record.url,
            status = %record.status,
            elapsed_ms = record.local_duration_ms,
            "dispatched"
        );
        record
    }
}

/// `"<code>: <reason>"`, e.g. `"404: Not Found"`. Codes without a canonical
/// reason keep the separator with an empty reason.
pub fn status_label(status: reqwest::StatusCode) -> String {
    format!(
        "{}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or_default()
    )
}

/// Transport failure text including every underlying cause, outermost first,
/// joined with `": "`.
pub fn error_label(error: &(dyn Error + 'static)) -> String {
    successors(Some(error), |&e| e.source())
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
