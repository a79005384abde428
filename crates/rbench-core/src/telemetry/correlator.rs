use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::config::TelemetrySettings;
use crate::error::RbenchError;
use crate::results::Record;
use crate::telemetry::{TelemetryEntry, TelemetrySource};

/// Poll-loop parameters.
#[derive(Debug, Clone)]
pub struct CorrelationOptions {
    pub timeframe: String,
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl Default for CorrelationOptions {
    fn default() -> Self {
        Self {
            timeframe: "1h".to_string(),
            max_attempts: 30,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl From<&TelemetrySettings> for CorrelationOptions {
    fn from(settings: &TelemetrySettings) -> Self {
        Self {
            timeframe: settings.timeframe.clone(),
            max_attempts: settings.max_attempts,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }
}

/// Why the poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    AllMatched,
    AttemptsExhausted,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CorrelationSummary {
    pub attempts: u32,
    pub matched: usize,
    pub total: usize,
    pub stop_reason: StopReason,
}

/// Exit condition of the poll loop, checked after every poll.
fn stop_reason(
    matched: usize,
    total: usize,
    attempts: u32,
    max_attempts: u32,
    cancel: &CancellationToken,
) -> Option<StopReason> {
    if matched >= total {
        Some(StopReason::AllMatched)
    } else if cancel.is_cancelled() {
        Some(StopReason::Cancelled)
    } else if attempts >= max_attempts {
        Some(StopReason::AttemptsExhausted)
    } else {
        None
    }
}

/// Poll `source` until every record carries server-side timing, the attempt
/// budget is spent, or `cancel` fires.
///
/// All operation ids go out in a single query per poll. A failed query is
/// logged and the loop carries on with the next tick. Matches found before
/// the loop ends are kept; unmatched records are left untouched.
///
/// Binding is a case-insensitive substring test of the record's operation id
/// against the entry's parent operation id. Short or overlapping ids can
/// therefore bind the wrong row; the heuristic is kept for compatibility with
/// the `Request-Id` format servers record.
pub async fn correlate(
    records: &mut [Record],
    source: &dyn TelemetrySource,
    options: &CorrelationOptions,
    cancel: &CancellationToken,
) -> Result<CorrelationSummary, RbenchError> {
    if options.timeframe.trim().is_empty() {
        return Err(RbenchError::Configuration(
            "Telemetry timeframe must not be empty".to_string(),
        ));
    }

    let total = records.len();
    let operation_ids = lowercase_ids(records);
    let mut matched = records.iter().filter(|r| r.is_correlated()).count();
    let mut attempts = 0u32;

    if cancel.is_cancelled() && matched < total {
        return Ok(CorrelationSummary {
            attempts,
            matched,
            total,
            stop_reason: StopReason::Cancelled,
        });
    }

    let stop = loop {
        if let Some(reason) = stop_reason(matched, total, attempts, options.max_attempts, cancel) {
            break reason;
        }

        attempts += 1;
        match source.query(&operation_ids, &options.timeframe).await {
            Ok(entries) => {
                let bound = bind_entries(records, &operation_ids, &entries);
                matched += bound;
                tracing::debug!(attempt = attempts, bound, matched, total, "Telemetry poll");
            }
            Err(e) => {
                tracing::warn!(attempt = attempts, "Telemetry query failed: {e}");
            }
        }

        if let Some(reason) = stop_reason(matched, total, attempts, options.max_attempts, cancel) {
            break reason;
        }

        tokio::select! {
            _ = cancel.cancelled() => break StopReason::Cancelled,
            _ = sleep(options.poll_interval) => {}
        }
    };

    tracing::info!(attempts, matched, total, reason = ?stop, "Telemetry correlation finished");

    Ok(CorrelationSummary {
        attempts,
        matched,
        total,
        stop_reason: stop,
    })
}

/// Lowercase operation id of each record, computed once per correlation.
fn lowercase_ids(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.operation_id.to_string().to_lowercase())
        .collect()
}

/// Bind entries to uncorrelated records, in entry order. Each entry binds at
/// most one record and each record at most one entry. Returns the number of
/// new bindings.
///
/// `ids` holds the lowercase operation id of each record, index-aligned with
/// `records`.
fn bind_entries(records: &mut [Record], ids: &[String], entries: &[TelemetryEntry]) -> usize {
    let mut taken: HashSet<String> = records
        .iter()
        .filter_map(|r| r.correlated_operation_id.clone())
        .collect();
    let mut bound = 0;

    for entry in entries {
        if taken.contains(&entry.operation_id) {
            continue;
        }

        let parent = entry.parent_operation_id.to_lowercase();
        let target = records
            .iter_mut()
            .zip(ids)
            .find(|(r, id)| !r.is_correlated() && parent.contains(id.as_str()));

        if let Some((record, _)) = target {
            record.correlated_operation_id = Some(entry.operation_id.clone());
            record.correlated_duration_ms = entry.duration_ms;
            taken.insert(entry.operation_id.clone());
            bound += 1;
        }
    }

    bound
}
