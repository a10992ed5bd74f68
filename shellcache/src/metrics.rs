//! Metrics declaration and recording helpers.

use std::time::Duration;

use shellcache_core::{ResponseSource, RouteClass};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    // Routing metrics

    /// Track number of routed requests per route class.
    pub static ref ROUTED_REQUESTS: &'static str = {
        metrics::describe_counter!(
            "shellcache_routed_requests_total",
            "Total number of intercepted requests per route class."
        );
        "shellcache_routed_requests_total"
    };
    /// Track number of responses per source.
    pub static ref SERVED_RESPONSES: &'static str = {
        metrics::describe_counter!(
            "shellcache_served_responses_total",
            "Total number of responses served per source."
        );
        "shellcache_served_responses_total"
    };
    /// Histogram of request handling duration.
    pub static ref REQUEST_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shellcache_request_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of request handling in seconds."
        );
        "shellcache_request_duration_seconds"
    };

    // Lifecycle metrics

    /// Track number of stale stores deleted on activation.
    pub static ref STORES_DELETED: &'static str = {
        metrics::describe_counter!(
            "shellcache_stores_deleted_total",
            "Total number of stale stores deleted on activation."
        );
        "shellcache_stores_deleted_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "shellcache_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "shellcache_offload_tasks_completed_total"
    };
    /// Track number of offload tasks that timed out.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_timeout_total",
            "Total number of offload tasks that timed out."
        );
        "shellcache_offload_tasks_timeout_total"
    };
    /// Track number of offload tasks skipped because one was in flight.
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "shellcache_offload_tasks_deduplicated_total",
            "Total number of offload tasks skipped because one for the same request was in flight."
        );
        "shellcache_offload_tasks_deduplicated_total"
    };
    /// Gauge of currently active offload tasks.
    pub static ref OFFLOAD_TASKS_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "shellcache_offload_tasks_active",
            "Number of currently active offload tasks."
        );
        "shellcache_offload_tasks_active"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "shellcache_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "shellcache_offload_task_duration_seconds"
    };
    /// Track number of background revalidations per outcome.
    pub static ref REVALIDATIONS: &'static str = {
        metrics::describe_counter!(
            "shellcache_revalidations_total",
            "Total number of background revalidations per outcome."
        );
        "shellcache_revalidations_total"
    };
}

/// Record one handled request.
///
/// When the `metrics` feature is disabled this is a no-op.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_request(route: RouteClass, source: Option<ResponseSource>, duration: Duration) {
    metrics::counter!(*ROUTED_REQUESTS, "route" => route.as_str()).increment(1);
    let source = source.map_or("none", |source| source.as_str());
    metrics::counter!(*SERVED_RESPONSES, "source" => source).increment(1);
    metrics::histogram!(*REQUEST_DURATION, "route" => route.as_str(), "source" => source)
        .record(duration.as_secs_f64());
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_request(_route: RouteClass, _source: Option<ResponseSource>, _duration: Duration) {}

/// Record the outcome of a background revalidation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_revalidation(refreshed: bool) {
    let outcome = if refreshed { "refreshed" } else { "failed" };
    metrics::counter!(*REVALIDATIONS, "outcome" => outcome).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_revalidation(_refreshed: bool) {}

/// Record stale stores deleted by one activation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_stores_deleted(count: usize) {
    metrics::counter!(*STORES_DELETED).increment(count as u64);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_stores_deleted(_count: usize) {}
