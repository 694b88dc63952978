//! Prometheus metrics for campaign runs.
//!
//! - Rows by outcome (skipped, preview, sent, error)
//! - Rows excluded by the sector filter
//! - Delivery latency
//!
//! A run can dump the text exposition to a file for a node-exporter style
//! textfile collector.

mod helpers;

pub use helpers::{encode_metrics, CampaignMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "campaign";

lazy_static! {
    /// Processed rows by outcome
    pub static ref ROWS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_rows_total", METRIC_PREFIX),
        "Rows processed, by outcome",
        &["status"]
    ).unwrap();

    /// Rows excluded by the sector filter
    pub static ref ROWS_FILTERED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_rows_filtered_total", METRIC_PREFIX),
        "Rows excluded by the sector filter"
    ).unwrap();

    /// Time spent in a single delivery attempt
    pub static ref DELIVERY_LATENCY: Histogram = register_histogram!(
        format!("{}_delivery_latency_seconds", METRIC_PREFIX),
        "Delivery attempt latency in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();
}
