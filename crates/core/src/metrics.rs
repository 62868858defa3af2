//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Fetchers (attempts per source and outcome, fetch latency)
//! - Store (operations by kind and outcome)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Fetchers
// =============================================================================

/// Fetch attempts by source and result.
pub static FETCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamelist_fetch_attempts_total",
            "Total fetch attempts against completion-time sources",
        ),
        &["source", "result"], // result: "success", "empty", "not_found", "error"
    )
    .unwrap()
});

/// Page fetch duration in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "gamelist_fetch_duration_seconds",
            "Duration of a page fetch and scrape",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Store
// =============================================================================

/// Store operations by kind and result.
pub static STORE_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gamelist_store_operations_total",
            "Total store operations",
        ),
        &["op", "result"], // result: "ok", "not_found", "skipped", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Count one store operation.
pub fn record_store_op(op: &str, result: &str) {
    STORE_OPERATIONS.with_label_values(&[op, result]).inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(FETCH_ATTEMPTS.clone()),
        Box::new(FETCH_DURATION.clone()),
        Box::new(STORE_OPERATIONS.clone()),
    ]
}
