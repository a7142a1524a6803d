//! # Metrics Registry
//!
//! Prometheus metrics for the resolution subsystem, registered with the
//! default registry. Exposition is owned by the host pipeline; this module
//! only defines and updates the series.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

pub static CACHE_HITS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "token_metadata_cache_hits_total",
        "Metadata field lookups answered from the in-process cache.",
        &["field"]
    ).expect("Failed to register token_metadata_cache_hits_total")
});

pub static CACHE_MISSES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "token_metadata_cache_misses_total",
        "Metadata field lookups that required a resolution chain.",
        &["field"]
    ).expect("Failed to register token_metadata_cache_misses_total")
});

pub static UPSTREAM_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "token_metadata_upstream_calls_total",
        "On-chain reads issued to the token source.",
        &["field"]
    ).expect("Failed to register token_metadata_upstream_calls_total")
});

pub static UPSTREAM_CALL_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "token_metadata_upstream_call_failures_total",
        "On-chain reads that failed and fell through to a fallback tier.",
        &["field"]
    ).expect("Failed to register token_metadata_upstream_call_failures_total")
});

pub static STATIC_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "token_metadata_static_fallbacks_total",
        "Field values served from the static registry after a failed read.",
        &["field"]
    ).expect("Failed to register token_metadata_static_fallbacks_total")
});

pub static DEFAULT_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "token_metadata_default_fallbacks_total",
        "Field values that bottomed out at the terminal default.",
        &["field"]
    ).expect("Failed to register token_metadata_default_fallbacks_total")
});

pub static RESOLUTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "token_metadata_resolution_duration_seconds",
        "End-to-end latency of a single (address, field) resolution chain.",
        &["field"]
    ).expect("Failed to register token_metadata_resolution_duration_seconds")
});
