//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{DELIVERY_LATENCY, ROWS_FILTERED_TOTAL, ROWS_TOTAL};
use crate::campaign::RowOutcome;

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording campaign row metrics
pub struct CampaignMetrics;

impl CampaignMetrics {
    /// Record the outcome of a processed row
    pub fn record_outcome(outcome: &RowOutcome) {
        let label = match outcome {
            RowOutcome::Skipped => "skipped",
            RowOutcome::Previewed => "preview",
            RowOutcome::Sent => "sent",
            RowOutcome::Failed(_) => "error",
        };
        ROWS_TOTAL.with_label_values(&[label]).inc();
    }

    /// Record a row excluded by the sector filter
    pub fn record_filtered() {
        ROWS_FILTERED_TOTAL.inc();
    }

    /// Record how long one delivery attempt took
    pub fn observe_delivery(elapsed: Duration) {
        DELIVERY_LATENCY.observe(elapsed.as_secs_f64());
    }
}
