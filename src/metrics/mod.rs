//! Prometheus metrics derived from the event log
//!
//! All values are recomputed from the pure analytics functions at scrape
//! time; nothing here keeps its own counters. Call [`init_metrics`] once
//! at startup; if registration fails, metric updates become no-ops.

use prometheus::{register_gauge_vec, register_int_gauge, Encoder, GaugeVec, IntGauge, TextEncoder};
use std::sync::OnceLock;

use crate::analytics::compute_uptime_ratio_window;
use crate::models::{PowerEvent, PowerState};

struct GridMetrics {
    events_total: IntGauge,
    power_status: GaugeVec,
    uptime_ratio: GaugeVec,
    last_change_ts: IntGauge,
}

static METRICS: OnceLock<GridMetrics> = OnceLock::new();

const STATUS_LABELS: [&str; 3] = ["online", "offline", "unknown"];

/// Register all metrics with the default registry.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    if METRICS.get().is_some() {
        return Ok(());
    }

    let metrics = GridMetrics {
        events_total: register_int_gauge!(
            "power_events_total",
            "Total number of recorded power events"
        )?,
        power_status: register_gauge_vec!(
            "power_status",
            "Current power status as a one-hot gauge",
            &["status"]
        )?,
        uptime_ratio: register_gauge_vec!(
            "power_uptime_ratio",
            "Power uptime ratio over a rolling window (0..1)",
            &["window"]
        )?,
        last_change_ts: register_int_gauge!(
            "power_last_change_timestamp_seconds",
            "Epoch seconds of the last recorded status change"
        )?,
    };

    METRICS.set(metrics).ok();
    Ok(())
}

/// Refresh every gauge from the given log snapshot and state blob.
pub fn update_from(events: &[PowerEvent], state: &PowerState, now_ts: i64) {
    let Some(metrics) = METRICS.get() else {
        return;
    };

    metrics.events_total.set(events.len() as i64);

    let current = match state.last_status {
        Some(true) => "online",
        Some(false) => "offline",
        None => "unknown",
    };
    for label in STATUS_LABELS {
        metrics
            .power_status
            .with_label_values(&[label])
            .set(if label == current { 1.0 } else { 0.0 });
    }

    for (label, window) in [("24h", 24 * 3600), ("7d", 7 * 24 * 3600)] {
        if let Some(ratio) = compute_uptime_ratio_window(events, window, now_ts) {
            metrics
                .uptime_ratio
                .with_label_values(&[label])
                .set(ratio);
        }
    }

    if let Some(ts) = state.last_change_ts {
        metrics.last_change_ts.set(ts);
    }
}

/// Encode the default registry as Prometheus text.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        tracing::warn!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
