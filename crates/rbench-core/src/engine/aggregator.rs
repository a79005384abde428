use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SlaSettings;
use crate::results::Record;

/// Appended to the grouping key when any record of the endpoint carries
/// server-side timing.
pub const CORRELATED_SUFFIX: &str = " (ai)";

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// Summary of one set of values, every field rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Distribution {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

impl Distribution {
    /// All zeros for an empty slice.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            min: round2(sorted[0]),
            max: round2(sorted[sorted.len() - 1]),
            mean: round2(mean),
            median: round2(median(&sorted)),
            std_dev: round2(variance.sqrt()),
            p90: round2(percentile(&sorted, 90.0)),
            p95: round2(percentile(&sorted, 95.0)),
            p99: round2(percentile(&sorted, 99.0)),
        }
    }
}

/// Nearest-rank percentile over an ascending, non-empty slice.
///
/// `p` must be in the range (0.0, 100.0].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// EndpointStats
// ---------------------------------------------------------------------------

/// Statistics for one endpoint group.
///
/// Distributions only cover the group's successful records (status containing
/// `200`); durations are in seconds and sizes in kilobytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EndpointStats {
    /// URL, suffixed with ` (ai)` when telemetry timing was used.
    pub key: String,
    pub url: String,
    pub correlated: bool,
    pub total_count: usize,
    pub ok_count: usize,
    pub duration: Distribution,
    pub size: Distribution,
    /// Percentage of successful records, rounded to a whole number.
    pub ok_ratio: u32,
    pub other_ratio: u32,
}

impl EndpointStats {
    pub const COLUMNS: [&'static str; 14] = [
        "endpoint",
        "count",
        "ok_ratio",
        "other_ratio",
        "dur_min",
        "dur_max",
        "dur_mean",
        "dur_median",
        "dur_std_dev",
        "dur_p90",
        "dur_p95",
        "dur_p99",
        "size_mean",
        "size_max",
    ];

    pub fn to_row(&self) -> Vec<String> {
        let d = &self.duration;
        vec![
            self.key.clone(),
            self.total_count.to_string(),
            self.ok_ratio.to_string(),
            self.other_ratio.to_string(),
            format!("{:.2}", d.min),
            format!("{:.2}", d.max),
            format!("{:.2}", d.mean),
            format!("{:.2}", d.median),
            format!("{:.2}", d.std_dev),
            format!("{:.2}", d.p90),
            format!("{:.2}", d.p95),
            format!("{:.2}", d.p99),
            format!("{:.2}", self.size.mean),
            format!("{:.2}", self.size.max),
        ]
    }

    /// `false` when p95 duration or mean size exceeds a configured threshold.
    pub fn meets_sla(&self, sla: &SlaSettings) -> bool {
        let duration_ok = sla
            .duration_secs
            .map_or(true, |limit| self.duration.p95 <= limit);
        let size_ok = sla.size_kb.map_or(true, |limit| self.size.mean <= limit);
        duration_ok && size_ok
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group records by endpoint, in first-occurrence order, and summarise each
/// group. Pure: the same input always yields the same output.
pub fn aggregate(records: &[Record]) -> Vec<EndpointStats> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Record>> = HashMap::new();

    for record in records {
        let url = record.url.as_str();
        groups
            .entry(url)
            .or_insert_with(|| {
                order.push(url);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .map(|url| summarise(url, &groups[url]))
        .collect()
}

fn summarise(url: &str, group: &[&Record]) -> EndpointStats {
    let correlated = group.iter().any(|r| r.is_correlated());
    let key = if correlated {
        format!("{url}{CORRELATED_SUFFIX}")
    } else {
        url.to_string()
    };

    let ok: Vec<&Record> = group.iter().copied().filter(|r| r.is_ok()).collect();

    let durations: Vec<f64> = ok
        .iter()
        .map(|r| round2(r.effective_duration_ms() / 1000.0))
        .collect();
    let sizes: Vec<f64> = ok
        .iter()
        .filter_map(|r| r.size_bytes)
        .map(|b| round2(b as f64 / 1024.0))
        .collect();

    let (ok_ratio, other_ratio) = if group.is_empty() {
        (0, 0)
    } else {
        let ok_ratio = (ok.len() as f64 / group.len() as f64 * 100.0).round() as u32;
        (ok_ratio, 100 - ok_ratio)
    };

    EndpointStats {
        key,
        url: url.to_string(),
        correlated,
        total_count: group.len(),
        ok_count: ok.len(),
        duration: Distribution::from_values(&durations),
        size: Distribution::from_values(&sizes),
        ok_ratio,
        other_ratio,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::model::{CompositeId, RequestDetail, WorkUnit};
    use uuid::Uuid;

    fn record(url: &str, status: &str, duration_ms: f64, size: Option<u64>) -> Record {
        let unit = WorkUnit {
            id: CompositeId::new(1, 1),
            operation_id: Uuid::new_v4(),
            endpoint_url: url.to_string(),
            detail: RequestDetail::default(),
        };
        let mut r = Record::for_unit(&unit);
        r.status = status.to_string();
        r.local_duration_ms = duration_ms;
        r.size_bytes = size;
        r
    }

    // -----------------------------------------------------------------------
    // percentile / distribution
    // -----------------------------------------------------------------------

    #[test]
    fn percentile_uses_nearest_rank() {
        let sorted: Vec<f64> = (1..=10).map(|v| v as f64 * 10.0).collect();
        // p50 of 10 sorted values => index ceil(0.5 * 10) - 1 = 4 => 50
        assert_eq!(percentile(&sorted, 50.0), 50.0);
        assert_eq!(percentile(&sorted, 90.0), 90.0);
        assert_eq!(percentile(&sorted, 95.0), 100.0);
        assert_eq!(percentile(&sorted, 100.0), 100.0);
    }

    #[test]
    fn percentile_single_value() {
        assert_eq!(percentile(&[2.5], 99.0), 2.5);
    }

    #[test]
    fn distribution_of_empty_slice_is_zero() {
        assert_eq!(Distribution::from_values(&[]), Distribution::default());
    }

    #[test]
    fn distribution_is_independent_of_input_order() {
        let a = Distribution::from_values(&[0.5, 0.1, 0.3, 0.2, 0.4]);
        let b = Distribution::from_values(&[0.1, 0.2, 0.3, 0.4, 0.5]);
        assert_eq!(a, b);
        assert_eq!(a.median, 0.3);
    }

    #[test]
    fn distribution_std_dev_is_population() {
        // Population std-dev of [2,4,4,4,5,5,7,9] is exactly 2.
        let d = Distribution::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(d.std_dev, 2.0);
        assert_eq!(d.mean, 5.0);
        assert_eq!(d.median, 4.5);
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }

    // -----------------------------------------------------------------------
    // aggregate
    // -----------------------------------------------------------------------

    #[test]
    fn four_ok_one_failed() {
        let records = vec![
            record("X", "200: OK", 1000.0, Some(1024)),
            record("X", "200: OK", 2000.0, Some(2048)),
            record("X", "200: OK", 3000.0, Some(1024)),
            record("X", "200: OK", 4000.0, Some(2048)),
            record("X", "500: Internal Server Error", 9000.0, None),
        ];
        let stats = aggregate(&records);

        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!(s.key, "X");
        assert_eq!(s.total_count, 5);
        assert_eq!(s.ok_count, 4);
        assert_eq!(s.duration.min, 1.0);
        assert_eq!(s.duration.max, 4.0);
        assert_eq!(s.duration.mean, 2.5);
        assert_eq!(s.duration.median, 2.5);
        assert_eq!(s.ok_ratio, 80);
        assert_eq!(s.other_ratio, 20);
        assert_eq!(s.size.min, 1.0);
        assert_eq!(s.size.max, 2.0);
        assert_eq!(s.size.mean, 1.5);
    }

    #[test]
    fn group_without_successes_is_all_zero() {
        let records = vec![
            record("Y", "503: Service Unavailable", 100.0, Some(10)),
            record("Y", "error sending request", 5.0, None),
        ];
        let s = &aggregate(&records)[0];
        assert_eq!(s.duration, Distribution::default());
        assert_eq!(s.size, Distribution::default());
        assert_eq!(s.ok_ratio, 0);
        assert_eq!(s.other_ratio, 100);
    }

    #[test]
    fn groups_follow_first_occurrence_order() {
        let records = vec![
            record("b", "200: OK", 1.0, None),
            record("a", "200: OK", 1.0, None),
            record("b", "200: OK", 1.0, None),
            record("c", "200: OK", 1.0, None),
        ];
        let keys: Vec<String> = aggregate(&records).into_iter().map(|s| s.key).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn correlated_groups_use_server_timing_and_suffix() {
        let mut correlated = record("Z", "200: OK", 900.0, None);
        correlated.correlated_operation_id = Some("srv".to_string());
        correlated.correlated_duration_ms = 250.0;
        let raw = record("Z", "200: OK", 750.0, None);

        let s = &aggregate(&[correlated, raw])[0];
        assert_eq!(s.key, "Z (ai)");
        assert_eq!(s.url, "Z");
        assert!(s.correlated);
        // Uncorrelated members fall back to local timing.
        assert_eq!(s.duration.min, 0.25);
        assert_eq!(s.duration.max, 0.75);
    }

    #[test]
    fn sizeless_records_do_not_count_towards_size() {
        let records = vec![
            record("S", "200: OK", 10.0, Some(2048)),
            record("S", "200: OK", 10.0, None),
        ];
        let s = &aggregate(&records)[0];
        assert_eq!(s.size.min, 2.0);
        assert_eq!(s.size.mean, 2.0);
    }

    #[test]
    fn ratios_are_rounded() {
        let records = vec![
            record("R", "200: OK", 10.0, None),
            record("R", "404: Not Found", 10.0, None),
            record("R", "404: Not Found", 10.0, None),
        ];
        let s = &aggregate(&records)[0];
        assert_eq!(s.ok_ratio, 33);
        assert_eq!(s.other_ratio, 67);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            record("A", "200: OK", 120.0, Some(100)),
            record("B", "500: Internal Server Error", 80.0, None),
            record("A", "200: OK", 340.0, Some(300)),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn sla_flags_slow_or_heavy_endpoints() {
        let records = vec![record("A", "200: OK", 2000.0, Some(4096))];
        let s = &aggregate(&records)[0];

        assert!(s.meets_sla(&SlaSettings::default()));
        assert!(s.meets_sla(&SlaSettings {
            duration_secs: Some(2.0),
            size_kb: Some(4.0),
        }));
        assert!(!s.meets_sla(&SlaSettings {
            duration_secs: Some(1.5),
            size_kb: None,
        }));
        assert!(!s.meets_sla(&SlaSettings {
            duration_secs: None,
            size_kb: Some(1.0),
        }));
    }

    #[test]
    fn row_matches_column_count() {
        let s = &aggregate(&[record("A", "200: OK", 1500.0, None)])[0];
        let row = s.to_row();
        assert_eq!(row.len(), EndpointStats::COLUMNS.len());
        assert_eq!(row[0], "A");
        assert_eq!(row[4], "1.50");
    }
}
