/// Metrics and telemetry for the naming system
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - resolutions by resolver kind and outcome
/// - resolution cache hit/miss rates
/// - publish outcomes

use crate::error::{NameError, NameResult};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Single-hop resolutions by resolver and status
    pub static ref NAMESYS_RESOLVE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "namesys_resolve_total",
        "Total number of single-hop name resolutions",
        &["resolver", "status"]
    )
    .unwrap();

    /// Resolution cache hits
    pub static ref NAMESYS_CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        "namesys_cache_hits_total",
        "Total number of resolution cache hits"
    )
    .unwrap();

    /// Resolution cache misses
    pub static ref NAMESYS_CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        "namesys_cache_misses_total",
        "Total number of resolution cache misses"
    )
    .unwrap();

    /// Publishes by status
    pub static ref NAMESYS_PUBLISH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "namesys_publish_total",
        "Total number of name record publishes",
        &["status"]
    )
    .unwrap();
}

/// Record the outcome of one resolver call
pub fn record_resolution(resolver: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    NAMESYS_RESOLVE_TOTAL
        .with_label_values(&[resolver, status])
        .inc();
}

pub fn record_cache_lookup(hit: bool) {
    if hit {
        NAMESYS_CACHE_HITS_TOTAL.inc();
    } else {
        NAMESYS_CACHE_MISSES_TOTAL.inc();
    }
}

pub fn record_publish(success: bool) {
    let status = if success { "success" } else { "error" };
    NAMESYS_PUBLISH_TOTAL.with_label_values(&[status]).inc();
}

/// Export all registered metrics in Prometheus text format
pub fn gather_metrics() -> NameResult<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| NameError::Internal(format!("Failed to encode metrics: {}", e)))?;

    String::from_utf8(buffer)
        .map_err(|e| NameError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
}
