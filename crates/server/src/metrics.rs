//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the gamelist server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Library size (collected dynamically)
//! - Core fetch and store metrics, registered from `gamelist_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

use gamelist_core::GameQuery;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "gamelist_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("gamelist_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "gamelist_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Library Metrics
// =============================================================================

/// Games currently stored (collected dynamically).
pub static GAMES_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("gamelist_games_stored", "Number of games in the store").unwrap()
});

/// Favorite games currently stored (collected dynamically).
pub static FAVORITES_STORED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "gamelist_favorites_stored",
        "Number of games marked favorite",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Library
    registry.register(Box::new(GAMES_STORED.clone())).unwrap();
    registry
        .register(Box::new(FAVORITES_STORED.clone()))
        .unwrap();

    // Core metrics (fetchers, store)
    for metric in gamelist_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the library gauges reflect the store.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    match state.library().query(&GameQuery::default()) {
        Ok(rows) => {
            GAMES_STORED.set(rows.len() as i64);
            FAVORITES_STORED.set(rows.iter().filter(|r| r.favorite).count() as i64);
        }
        Err(e) => warn!(error = %e, "Failed to collect library metrics"),
    }
}

/// Routes that sit beside `/games/{name}` and must not be mistaken for a name.
const GAME_ACTIONS: &[&str] = &["manual", "import", "refresh"];

/// Normalize a path for metric labels (replace game names with a placeholder).
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').collect();
    if let Some(games) = segments.iter().position(|s| *s == "games") {
        if let Some(name) = segments.get_mut(games + 1) {
            if !name.is_empty() && !GAME_ACTIONS.contains(&*name) {
                *name = "{name}";
            }
        }
    }
    segments.join("/")
}
