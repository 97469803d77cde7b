//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Operations (per-operation outcomes)
//! - Pipeline stages (completed, skipped, aborted)
//! - Engine invocations (duration by result)
//! - Source fetches (by kind and outcome)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Operations
// =============================================================================

/// Operations total by operation and outcome.
pub static OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipforge_operations_total", "Total media operations"),
        &["operation", "outcome"], // outcome: "success" or an error kind
    )
    .unwrap()
});

// =============================================================================
// Pipeline
// =============================================================================

/// Pipeline stage outcomes.
pub static PIPELINE_STAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipforge_pipeline_stages_total",
            "Full-pipeline stage outcomes",
        ),
        &["stage", "outcome"], // "completed", "skipped", "aborted"
    )
    .unwrap()
});

// =============================================================================
// Engine
// =============================================================================

/// Engine invocation duration in seconds.
pub static ENGINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipforge_engine_duration_seconds",
            "Duration of media engine invocations",
        )
        .buckets(vec![
            0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 900.0,
        ]),
        &["step", "result"], // result: "success", "failed", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Sources
// =============================================================================

/// Source resolutions by descriptor kind and outcome.
pub static SOURCE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipforge_source_fetches_total",
            "Source resolutions by kind",
        ),
        &["kind", "outcome"], // kind: "url", "upstream", "inline"
    )
    .unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(OPERATIONS_TOTAL.clone()),
        Box::new(PIPELINE_STAGES.clone()),
        Box::new(ENGINE_DURATION.clone()),
        Box::new(SOURCE_FETCHES.clone()),
    ]
}
