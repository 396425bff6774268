//! Query lifecycle hooks and the metrics-recording observer.
//!
//! # States
//! ```text
//! on_start ──▶ started ──▶ on_success ──▶ completed
//!                     └──▶ on_error   ──▶ failed
//! ```
//!
//! # Design Decisions
//! - Terminal hooks consume the context, so no call is finalized twice
//! - Every recording step runs inside `best_effort`; a failing sink or label
//!   computation can never change the outcome of the query
//! - The slow-query sample is recorded separately, so losing it never loses
//!   the duration observation or the execution count
//! - Slow-query samples carry an explicit caller location supplied by the
//!   call site instead of inspecting the stack

use std::sync::Arc;
use std::time::Duration;

use crate::config::QueryConfig;
use crate::observability::best_effort;
use crate::observability::metrics::{
    MetricsSink, QUERY_DURATION_SECONDS, QUERY_ERRORS_TOTAL, QUERY_EXECUTE_TOTAL,
    SLOW_QUERY_DETAILS,
};
use crate::query::context::{CallerLocation, QueryCall, QueryCallContext};
use crate::query::operation::operation_label;

/// Queries strictly slower than this are reported as slow-query samples.
pub const SLOW_QUERY_THRESHOLD: Duration = Duration::from_secs(1);

/// Placeholder for caller fields when no matching location is known.
pub const UNKNOWN_LOCATION: &str = "unknown";

/// Lifecycle callbacks around a single data-access call.
pub trait QueryInterceptor: Send + Sync {
    /// Pre-call: begin timing.
    fn on_start(&self, call: QueryCall) -> QueryCallContext;

    /// Post-call success.
    fn on_success(&self, ctx: QueryCallContext);

    /// Post-call failure, classified by `error_type`.
    fn on_error(&self, ctx: QueryCallContext, error_type: &str);
}

/// Records duration, execution, error and slow-query metrics.
#[derive(Clone)]
pub struct QueryObserver {
    metrics: Arc<dyn MetricsSink>,
    caller_path_filter: Option<String>,
}

impl QueryObserver {
    pub fn new(metrics: Arc<dyn MetricsSink>, config: &QueryConfig) -> Self {
        Self {
            metrics,
            caller_path_filter: config.caller_path_filter.clone(),
        }
    }

    /// Record a successful call that took `duration`.
    pub(crate) fn record_success(&self, ctx: &QueryCallContext, duration: Duration) {
        let seconds = duration.as_secs_f64();

        if duration > SLOW_QUERY_THRESHOLD {
            best_effort("query.slow_sample", || {
                self.record_slow_query(ctx, &ctx.operation(), seconds);
            });
        }

        best_effort("query.on_success", || {
            let labels = [("operation", ctx.operation())];
            self.metrics
                .observe_histogram(QUERY_DURATION_SECONDS, &labels, seconds);
            self.metrics.increment_counter(QUERY_EXECUTE_TOTAL, &labels);
        });
    }

    fn record_slow_query(&self, ctx: &QueryCallContext, operation: &str, seconds: f64) {
        let (file_name, line_number) = self.resolve_caller(ctx.caller());
        let duration = format!("{seconds:.3}s");
        let statement = ctx.statement().unwrap_or_default();

        tracing::warn!(
            operation,
            statement,
            parameters = ctx.parameters(),
            duration = %duration,
            file_name = %file_name,
            line_number = %line_number,
            "Slow query"
        );

        let labels = [
            ("operation", operation.to_string()),
            ("query_text", statement.to_string()),
            ("parameters", ctx.parameters().to_string()),
            ("duration", duration),
            ("file_name", file_name),
            ("line_number", line_number),
        ];
        self.metrics.observe_histogram(SLOW_QUERY_DETAILS, &labels, seconds);
    }

    /// File and line to report for a call, or `unknown` for both.
    fn resolve_caller(&self, caller: Option<&CallerLocation>) -> (String, String) {
        let matched = caller.filter(|loc| match &self.caller_path_filter {
            Some(filter) => loc.file.contains(filter.as_str()),
            None => true,
        });
        match matched {
            Some(loc) => (loc.file.clone(), loc.line.to_string()),
            None => (UNKNOWN_LOCATION.to_string(), UNKNOWN_LOCATION.to_string()),
        }
    }
}

impl QueryInterceptor for QueryObserver {
    fn on_start(&self, call: QueryCall) -> QueryCallContext {
        QueryCallContext::start(call)
    }

    fn on_success(&self, ctx: QueryCallContext) {
        let duration = ctx.elapsed();
        self.record_success(&ctx, duration);
    }

    fn on_error(&self, ctx: QueryCallContext, error_type: &str) {
        best_effort("query.on_error", || {
            let operation = operation_label(ctx.statement());
            tracing::debug!(operation = %operation, error_type, "Query failed");
            self.metrics.increment_counter(
                QUERY_ERRORS_TOTAL,
                &[("operation", operation), ("error_type", error_type.to_string())],
            );
        });
    }
}
