// ABOUTME: HTTP server hosting the per-bridge MCP endpoint and the management API
// ABOUTME: Assembles routes and middleware layers, binds the listener and serves until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Bridge MCP Server
//!
//! One process serves every bridge. Requests to `POST /mcp/:bridge_id` are
//! dispatched against the bridge named in the path; nothing is shared between
//! requests except the read-only [`ServerResources`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{debug, info, warn, Level};

use super::resources::ServerResources;
use crate::constants::defaults::RATE_LIMIT_PURGE_INTERVAL_SECS;
use crate::errors::{AppError, AppResult};
use crate::middleware::{request_id_middleware, setup_cors};
#[cfg(feature = "management-api")]
use crate::routes::{BridgeRoutes, TokenRoutes};
use crate::routes::{HealthRoutes, McpRoutes};

/// MCP bridge HTTP server
pub struct BridgeMcpServer {
    resources: Arc<ServerResources>,
}

impl BridgeMcpServer {
    /// Server over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Router with every route and the body size limit, without outer layers
    ///
    /// Used directly by tests through `tower::ServiceExt::oneshot`.
    #[must_use]
    pub fn router(resources: &Arc<ServerResources>) -> Router {
        let router = Router::new()
            .merge(HealthRoutes::routes())
            .merge(McpRoutes::routes(resources.clone()));

        #[cfg(feature = "management-api")]
        let router = router
            .merge(BridgeRoutes::routes(resources.clone()))
            .merge(TokenRoutes::routes(resources.clone()));

        router.layer(DefaultBodyLimit::max(resources.config.max_body_bytes))
    }

    /// Bind to the configured host and `port` and serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns an internal error if the listener cannot be bound or the
    /// server fails while serving
    pub async fn run(&self, port: u16) -> AppResult<()> {
        info!("HTTP server (Axum) starting on port {}", port);

        let app = Self::router(&self.resources)
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(
                        DefaultMakeSpan::new()
                            .level(Level::INFO)
                            .include_headers(false),
                    )
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(LatencyUnit::Millis),
                    ),
            )
            .layer(middleware::from_fn(request_id_middleware))
            .layer(setup_cors(&self.resources.config));

        let host = &self.resources.config.host;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], port)));
        info!("HTTP server (Axum) listening on http://{}", addr);

        let purge_task = self.spawn_rate_limit_purge();

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Transport error: {e}")))?;
        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Transport error: {e}")));

        purge_task.abort();
        info!("HTTP server stopped");
        served
    }

    fn spawn_rate_limit_purge(&self) -> tokio::task::JoinHandle<()> {
        let limiter = self.resources.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(RATE_LIMIT_PURGE_INTERVAL_SECS));
            interval.tick().await;
            loop {
                interval.tick().await;
                limiter.purge_expired();
                debug!("Purged expired rate limit windows");
            }
        })
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
