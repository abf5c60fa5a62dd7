// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handlers.

use axum::{response::IntoResponse, Json};

/// GET /health
///
/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// GET /ready
///
/// Readiness probe.
pub async fn ready() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ready" }))
}
