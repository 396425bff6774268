//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define cache and query metrics (names, label schemas, buckets)
//! - Abstract the registry behind [`MetricsSink`] so callers can inject it
//! - Install the Prometheus recorder backing [`PrometheusSink`]
//!
//! # Metrics
//! - `cache_get_total` (counter): cache reads by backend
//! - `cache_get_hits_total` (counter): cache reads that found a value, by backend
//! - `db_query_duration_seconds` (histogram): query latency by operation
//! - `db_execute_total` (counter): completed queries by operation
//! - `db_errors_total` (counter): failed queries by operation, error_type
//! - `db_slow_query_details` (histogram): queries slower than one second, with
//!   statement, parameters, duration and caller location labels

use dashmap::DashMap;
use metrics::Label;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const CACHE_GET_TOTAL: &str = "cache_get_total";
pub const CACHE_GET_HITS_TOTAL: &str = "cache_get_hits_total";
pub const QUERY_DURATION_SECONDS: &str = "db_query_duration_seconds";
pub const QUERY_EXECUTE_TOTAL: &str = "db_execute_total";
pub const QUERY_ERRORS_TOTAL: &str = "db_errors_total";
pub const SLOW_QUERY_DETAILS: &str = "db_slow_query_details";

/// Bucket boundaries (seconds) for query duration histograms.
pub const QUERY_DURATION_BUCKETS: [f64; 9] = [0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0];

/// A single label pair as handed to a sink.
pub type LabelPair = (&'static str, String);

/// Process-wide counter/histogram registry.
///
/// Implementations must be safe to call concurrently from any number of
/// threads without caller-side locking.
pub trait MetricsSink: Send + Sync {
    /// Increment the counter `name` for the given label set by one.
    fn increment_counter(&self, name: &'static str, labels: &[LabelPair]);

    /// Record one observation into the histogram `name`.
    fn observe_histogram(&self, name: &'static str, labels: &[LabelPair], value: f64);
}

/// Sink that forwards to the globally installed `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn increment_counter(&self, name: &'static str, labels: &[LabelPair]) {
        metrics::counter!(name, to_labels(labels)).increment(1);
    }

    fn observe_histogram(&self, name: &'static str, labels: &[LabelPair], value: f64) {
        metrics::histogram!(name, to_labels(labels)).record(value);
    }
}

fn to_labels(labels: &[LabelPair]) -> Vec<Label> {
    labels
        .iter()
        .map(|(key, value)| Label::new(*key, value.clone()))
        .collect()
}

/// Build a Prometheus recorder configured with this crate's buckets.
///
/// The recorder is not installed; see [`init_metrics`].
pub fn build_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(QUERY_DURATION_SECONDS.to_string()),
            &QUERY_DURATION_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Full(SLOW_QUERY_DETAILS.to_string()),
            &QUERY_DURATION_BUCKETS,
        )
}

/// Install the Prometheus recorder globally and describe all metrics.
///
/// The returned handle renders the scrape payload for the metrics endpoint.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = build_builder()?.install_recorder()?;
    describe_metrics();
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(CACHE_GET_TOTAL, "Total number of cache get requests");
    metrics::describe_counter!(CACHE_GET_HITS_TOTAL, "Total number of cache hits");
    metrics::describe_histogram!(
        QUERY_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Duration of database queries in seconds"
    );
    metrics::describe_counter!(QUERY_EXECUTE_TOTAL, "Total number of database executions");
    metrics::describe_counter!(QUERY_ERRORS_TOTAL, "Total number of database errors");
    metrics::describe_histogram!(
        SLOW_QUERY_DETAILS,
        metrics::Unit::Seconds,
        "Details of queries taking more than one second"
    );
}

/// In-memory sink that keeps exact label/value pairs.
///
/// Series are keyed by name plus the sorted label set, so label order at the
/// call site does not matter.
#[derive(Debug, Default)]
pub struct InMemorySink {
    counters: DashMap<String, u64>,
    histograms: DashMap<String, Vec<f64>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one counter series (0 if never incremented).
    pub fn counter(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.counters
            .get(&series_key(name, labels))
            .map(|v| *v)
            .unwrap_or(0)
    }

    /// Sum of a counter across every label set.
    pub fn counter_total(&self, name: &str) -> u64 {
        self.counters
            .iter()
            .filter(|entry| series_name(entry.key()) == name)
            .map(|entry| *entry.value())
            .sum()
    }

    /// Observations recorded into one histogram series, in arrival order.
    pub fn observations(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.histograms
            .get(&series_key(name, labels))
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Number of observations across every label set of a histogram.
    pub fn observation_count(&self, name: &str) -> usize {
        self.histograms
            .iter()
            .filter(|entry| series_name(entry.key()) == name)
            .map(|entry| entry.value().len())
            .sum()
    }

    /// Label sets seen for a histogram, each rendered as sorted `(key, value)` pairs.
    pub fn histogram_series(&self, name: &str) -> Vec<Vec<(String, String)>> {
        self.histograms
            .iter()
            .filter(|entry| series_name(entry.key()) == name)
            .map(|entry| parse_labels(entry.key()))
            .collect()
    }
}

impl MetricsSink for InMemorySink {
    fn increment_counter(&self, name: &'static str, labels: &[LabelPair]) {
        let key = series_key(name, &borrow_labels(labels));
        *self.counters.entry(key).or_insert(0) += 1;
    }

    fn observe_histogram(&self, name: &'static str, labels: &[LabelPair], value: f64) {
        let key = series_key(name, &borrow_labels(labels));
        self.histograms.entry(key).or_default().push(value);
    }
}

fn borrow_labels(labels: &[LabelPair]) -> Vec<(&str, &str)> {
    labels.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

// Series keys use control characters as separators so label values may
// contain any printable text (statements, parameters).
const NAME_SEP: char = '\u{1}';
const PAIR_SEP: char = '\u{2}';
const KV_SEP: char = '\u{3}';

fn series_key(name: &str, labels: &[(&str, &str)]) -> String {
    let mut sorted: Vec<_> = labels.to_vec();
    sorted.sort_unstable();
    let rendered: Vec<String> = sorted
        .iter()
        .map(|(k, v)| format!("{k}{KV_SEP}{v}"))
        .collect();
    format!("{name}{NAME_SEP}{}", rendered.join(&PAIR_SEP.to_string()))
}

fn series_name(key: &str) -> &str {
    key.split(NAME_SEP).next().unwrap_or(key)
}

fn parse_labels(key: &str) -> Vec<(String, String)> {
    let Some((_, rest)) = key.split_once(NAME_SEP) else {
        return Vec::new();
    };
    rest.split(PAIR_SEP)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| pair.split_once(KV_SEP))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
