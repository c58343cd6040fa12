// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

/// Prometheus text exposition
pub async fn get_metrics() -> impl IntoResponse {
    match crate::metrics::render() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to encode metrics: {}", e),
        ),
    }
}
