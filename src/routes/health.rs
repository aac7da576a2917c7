// ABOUTME: Liveness route for load balancers and orchestration probes
// ABOUTME: Reports service name, version and current time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::{routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::constants::service_names::BRIDGE_MCP_SERVER;

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests
    pub status: &'static str,
    /// Service name
    pub service: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Server time (RFC 3339)
    pub timestamp: String,
}

/// Health routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create health routes
    pub fn routes() -> Router {
        Router::new().route("/health", get(Self::handle_health))
    }

    /// Handle GET /health
    async fn handle_health() -> Json<HealthResponse> {
        Json(HealthResponse {
            status: "ok",
            service: BRIDGE_MCP_SERVER,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}
