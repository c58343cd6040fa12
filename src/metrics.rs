// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec, Encoder, IntCounterVec, TextEncoder};

/// Viewer join/leave/reset operations by outcome
pub static VIEWER_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "livestream_viewer_events_total",
        "Viewer count operations on livestreams",
        &["action", "outcome"]
    )
    .expect("Failed to register viewer events metric")
});

/// Best-effort operations that fell back to a default
pub static DEGRADED_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "livestream_degraded_operations_total",
        "Best-effort operations that returned a degraded result",
        &["operation"]
    )
    .expect("Failed to register degraded operations metric")
});

/// Payment processor webhook deliveries
pub static WEBHOOK_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "billing_webhook_events_total",
        "Payment processor webhook events by type and outcome",
        &["event_type", "outcome"]
    )
    .expect("Failed to register webhook events metric")
});

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    // Touch the statics so they show up before their first increment
    Lazy::force(&VIEWER_EVENTS);
    Lazy::force(&DEGRADED_OPERATIONS);
    Lazy::force(&WEBHOOK_EVENTS);

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
