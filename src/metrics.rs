// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Uptime Kuma controller.
//!
//! All metrics use the `uptime_kuma_controller` prefix and live in
//! [`METRICS_REGISTRY`], exposed over HTTP by [`serve`].
//!
//! # Metrics
//!
//! - **Cycle metrics** - outcome and duration of each reconciliation cycle
//! - **Inventory gauges** - hosts and owned monitors seen by the last successful cycle
//! - **Change counters** - monitors created, deleted and failed deletions
//!
//! # Example
//!
//! ```rust,no_run
//! use uptime_kuma_controller::metrics::{gather_metrics, record_cycle_error};
//!
//! record_cycle_error(std::time::Duration::from_secs(1));
//! println!("{}", gather_metrics().unwrap());
//! ```

use crate::constants::METRICS_SERVER_PATH;
use crate::reconciler::CycleReport;
use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all controller metrics
const METRICS_NAMESPACE: &str = "uptime_kuma_controller";

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn register<C>(collector: C) -> C
where
    C: prometheus::core::Collector + Clone + 'static,
{
    METRICS_REGISTRY
        .register(Box::new(collector.clone()))
        .expect("metric registered twice");
    collector
}

// ============================================================================
// Cycle Metrics
// ============================================================================

/// Total number of reconciliation cycles
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static CYCLES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cycles_total"),
        "Total number of reconciliation cycles by status",
    );
    register(CounterVec::new(opts, &["status"]).expect("valid metric definition"))
});

/// Duration of reconciliation cycles in seconds
pub static CYCLE_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_cycle_duration_seconds"),
        "Duration of reconciliation cycles in seconds",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]);
    register(Histogram::with_opts(opts).expect("valid metric definition"))
});

// ============================================================================
// Inventory Gauges
// ============================================================================

/// Distinct host records derived from ingresses in the last successful cycle
pub static HOSTS_DISCOVERED: LazyLock<Gauge> = LazyLock::new(|| {
    register(
        Gauge::new(
            format!("{METRICS_NAMESPACE}_hosts_discovered"),
            "Distinct ingress host records seen by the last successful cycle",
        )
        .expect("valid metric definition"),
    )
});

/// Monitors carrying the controller tag in the last successful cycle
pub static OWNED_MONITORS: LazyLock<Gauge> = LazyLock::new(|| {
    register(
        Gauge::new(
            format!("{METRICS_NAMESPACE}_owned_monitors"),
            "Monitors carrying the controller tag at the start of the last successful cycle",
        )
        .expect("valid metric definition"),
    )
});

// ============================================================================
// Change Counters
// ============================================================================

pub static MONITORS_CREATED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    register(
        Counter::new(
            format!("{METRICS_NAMESPACE}_monitors_created_total"),
            "Total number of monitors created and tagged",
        )
        .expect("valid metric definition"),
    )
});

pub static MONITORS_DELETED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    register(
        Counter::new(
            format!("{METRICS_NAMESPACE}_monitors_deleted_total"),
            "Total number of monitors deleted",
        )
        .expect("valid metric definition"),
    )
});

pub static MONITOR_DELETE_FAILURES_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    register(
        Counter::new(
            format!("{METRICS_NAMESPACE}_monitor_delete_failures_total"),
            "Total number of monitor deletions that failed",
        )
        .expect("valid metric definition"),
    )
});

/// Ingress rules skipped because they carried no usable host
pub static NORMALIZATION_ERRORS_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    register(
        Counter::new(
            format!("{METRICS_NAMESPACE}_normalization_errors_total"),
            "Total number of ingress rules skipped during normalization",
        )
        .expect("valid metric definition"),
    )
});

// ============================================================================
// Recording Helpers
// ============================================================================

/// Record a successful cycle and refresh the inventory gauges from its report
#[allow(clippy::cast_precision_loss)]
pub fn record_cycle_success(duration: Duration, report: &CycleReport) {
    CYCLES_TOTAL.with_label_values(&[STATUS_SUCCESS]).inc();
    CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
    HOSTS_DISCOVERED.set(report.hosts_discovered as f64);
    OWNED_MONITORS.set(report.owned_monitors as f64);
    NORMALIZATION_ERRORS_TOTAL.inc_by(report.normalization_errors as f64);
}

/// Record a failed cycle
pub fn record_cycle_error(duration: Duration) {
    CYCLES_TOTAL.with_label_values(&[STATUS_ERROR]).inc();
    CYCLE_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_monitor_created() {
    MONITORS_CREATED_TOTAL.inc();
}

pub fn record_monitor_deleted() {
    MONITORS_DELETED_TOTAL.inc();
}

pub fn record_monitor_delete_failure() {
    MONITOR_DELETE_FAILURES_TOTAL.inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

// ============================================================================
// HTTP Exposition
// ============================================================================

/// Handler for `GET /metrics`
pub async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Router exposing the metrics endpoint
pub fn metrics_router() -> Router {
    Router::new().route(METRICS_SERVER_PATH, get(metrics_handler))
}

/// Serve the metrics endpoint on `bind_address` until `shutdown` is cancelled.
///
/// # Errors
/// Returns error if the address cannot be bound or the server fails.
pub async fn serve(bind_address: &str, shutdown: CancellationToken) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind metrics server to {bind_address}"))?;
    info!(
        address = %bind_address,
        path = METRICS_SERVER_PATH,
        "Metrics server listening"
    );

    axum::serve(listener, metrics_router())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("Metrics server failed")
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod metrics_tests;
