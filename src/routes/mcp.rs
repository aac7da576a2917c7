// ABOUTME: HTTP endpoint receiving JSON-RPC requests for one bridge
// ABOUTME: Hands the raw body to the MCP dispatcher and maps its outcome to an HTTP response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::debug;

use crate::constants::errors::{ERROR_INVALID_REQUEST, ERROR_PARSE};
use crate::jsonrpc::{JsonRpcError, JsonRpcResponse};
use crate::mcp::dispatcher::{CallerContext, McpDispatcher};
use crate::mcp::resources::ServerResources;

/// MCP routes handler
pub struct McpRoutes;

impl McpRoutes {
    /// Create the per-bridge JSON-RPC route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/mcp/:bridge_id", post(Self::handle_rpc))
            .with_state(McpDispatcher::new(resources))
    }

    /// Handle POST /mcp/:bridge_id
    ///
    /// The body is taken as raw bytes so malformed JSON reaches the
    /// dispatcher and is answered with a JSON-RPC parse error. A body over
    /// the size limit is answered with 413 and a JSON-RPC invalid request.
    async fn handle_rpc(
        State(dispatcher): State<McpDispatcher>,
        Path(bridge_id): Path<String>,
        connect_info: Option<ConnectInfo<SocketAddr>>,
        headers: HeaderMap,
        body: Result<Bytes, BytesRejection>,
    ) -> Response {
        let body = match body {
            Ok(body) => body,
            Err(rejection) => return Self::rejected_body(&rejection),
        };
        let caller = CallerContext {
            headers,
            client_addr: connect_info.map(|ConnectInfo(addr)| addr),
        };
        let outcome = dispatcher.dispatch(&bridge_id, &body, &caller).await;
        (outcome.status, Json(outcome.response)).into_response()
    }

    fn rejected_body(rejection: &BytesRejection) -> Response {
        let status = rejection.status();
        debug!(%status, reason = %rejection.body_text(), "MCP request body rejected");
        let error = if status == StatusCode::PAYLOAD_TOO_LARGE {
            JsonRpcError::new(ERROR_INVALID_REQUEST, "Request body too large")
        } else {
            JsonRpcError::new(ERROR_PARSE, "Parse error")
        };
        (status, Json(JsonRpcResponse::error(Value::Null, error))).into_response()
    }
}
