// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides server resources, bridge fixtures, sessions, access tokens and RPC helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `bridge_mcp_server`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue};
use bridge_core::{BridgeConfiguration, BridgeDefinition};
use bridge_mcp_server::{
    auth::JwtSessionResolver,
    bridge::definition::build_configuration,
    config::environment::ServerConfig,
    constants::headers::SESSION_HEADER,
    mcp::{
        dispatcher::{CallerContext, DispatchOutcome, McpDispatcher},
        resources::ServerResources,
    },
    tokens::{issue_token, CreateTokenRequest},
};
use serde_json::{json, Value};

pub const TEST_ENCRYPTION_SECRET: &str = "test-encryption-secret";
pub const TEST_SESSION_SECRET: &str = "test-session-secret";
pub const OWNER_ID: &str = "owner-1";
pub const STRANGER_ID: &str = "stranger-1";
pub const UPSTREAM_TOKEN: &str = "upstream-bearer-token";

/// Configuration with sessions enabled and rate limiting off
pub fn test_config() -> ServerConfig {
    let mut config =
        ServerConfig::new(TEST_ENCRYPTION_SECRET).with_session_secret(TEST_SESSION_SECRET);
    config.rate_limit.requests_per_minute = 0;
    config
}

/// Resources over `test_config()`
pub fn create_test_resources() -> ServerResources {
    ServerResources::new(test_config()).unwrap()
}

/// Bridge definition for a small blog API at `base_url`
///
/// Tools, in order: `list_posts`, `get_post`, `create_post`.
pub fn posts_definition(base_url: &str) -> Value {
    json!({
        "id": "posts",
        "name": "Test Bridge",
        "description": "Blog API",
        "baseUrl": base_url,
        "auth": {"type": "bearer", "token": UPSTREAM_TOKEN},
        "headers": {"X-Client": "bridge-tests"},
        "access": {"public": false, "authRequired": true},
        "endpoints": [
            {
                "name": "list_posts",
                "method": "GET",
                "path": "/posts",
                "description": "List posts",
                "parameters": [
                    {"name": "page", "type": "number", "required": false}
                ]
            },
            {
                "name": "get_post",
                "method": "GET",
                "path": "/posts/{id}",
                "description": "Fetch one post",
                "parameters": [
                    {"name": "id", "type": "number", "required": true},
                    {"name": "expand", "type": "boolean", "required": false}
                ]
            },
            {
                "name": "create_post",
                "method": "POST",
                "path": "/posts",
                "description": "Create a post",
                "parameters": [
                    {"name": "title", "type": "string", "required": true},
                    {"name": "body", "type": "string", "required": false}
                ]
            }
        ]
    })
}

/// Seal `definition` for `OWNER_ID` and store it
pub async fn insert_bridge(
    resources: &ServerResources,
    definition: Value,
) -> Arc<BridgeConfiguration> {
    let definition: BridgeDefinition = serde_json::from_value(definition).unwrap();
    let bridge =
        build_configuration(definition, OWNER_ID, &resources.encryption, None).unwrap();
    resources.bridges.create(bridge).await.unwrap()
}

/// Signed session token for `user_id`
pub fn session_token(user_id: &str) -> String {
    JwtSessionResolver::new(TEST_SESSION_SECRET.as_bytes())
        .issue(user_id, chrono::Duration::hours(1))
        .unwrap()
}

/// Headers carrying an owner session for `user_id`
pub fn session_headers(user_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        SESSION_HEADER,
        HeaderValue::from_str(&session_token(user_id)).unwrap(),
    );
    headers
}

/// Headers carrying `Authorization: Bearer <token>`
pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

/// Issue and store an access token for `bridge_id`, returning its plaintext
pub async fn issue_access_token(
    resources: &ServerResources,
    bridge_id: &str,
    permissions: Value,
) -> String {
    let request: CreateTokenRequest = serde_json::from_value(json!({
        "name": "test token",
        "permissions": permissions,
    }))
    .unwrap();
    let (token, secret) = issue_token(bridge_id, request).unwrap();
    resources.tokens.create(token).await.unwrap();
    secret.as_str().to_owned()
}

/// Dispatch a raw body to `bridge_id`
pub async fn rpc_raw(
    resources: &Arc<ServerResources>,
    bridge_id: &str,
    body: &[u8],
    headers: HeaderMap,
) -> DispatchOutcome {
    let caller = CallerContext {
        headers,
        client_addr: None,
    };
    McpDispatcher::new(resources.clone())
        .dispatch(bridge_id, body, &caller)
        .await
}

/// Dispatch a JSON-RPC request as if it arrived from `client_addr`
pub async fn rpc_from(
    resources: &Arc<ServerResources>,
    bridge_id: &str,
    method: &str,
    headers: HeaderMap,
    client_addr: SocketAddr,
) -> DispatchOutcome {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": {}});
    let caller = CallerContext {
        headers,
        client_addr: Some(client_addr),
    };
    McpDispatcher::new(resources.clone())
        .dispatch(bridge_id, body.to_string().as_bytes(), &caller)
        .await
}

/// Dispatch a JSON-RPC request built from `method` and `params`
pub async fn rpc(
    resources: &Arc<ServerResources>,
    bridge_id: &str,
    method: &str,
    params: Value,
    headers: HeaderMap,
) -> DispatchOutcome {
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
    rpc_raw(resources, bridge_id, body.to_string().as_bytes(), headers).await
}

/// Result object of a successful outcome
pub fn result_of(outcome: &DispatchOutcome) -> &Value {
    assert!(
        outcome.response.error.is_none(),
        "unexpected error: {:?}",
        outcome.response.error
    );
    outcome.response.result.as_ref().unwrap()
}

/// Error code of a failed outcome
pub fn error_code(outcome: &DispatchOutcome) -> i32 {
    outcome
        .response
        .error
        .as_ref()
        .unwrap_or_else(|| panic!("expected an error, got {:?}", outcome.response.result))
        .code
}
