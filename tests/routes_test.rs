// ABOUTME: HTTP-level tests for health, the MCP endpoint and the management API
// ABOUTME: Drives the assembled router with tower oneshot requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bridge_mcp_server::constants::headers::SESSION_HEADER;
use bridge_mcp_server::mcp::resources::ServerResources;
use bridge_mcp_server::mcp::server::BridgeMcpServer;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{
    create_test_resources, posts_definition, session_token, test_config, OWNER_ID, STRANGER_ID,
    UPSTREAM_TOKEN,
};

fn app() -> (Router, Arc<ServerResources>) {
    let resources = Arc::new(create_test_resources());
    (BridgeMcpServer::router(&resources), resources)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(SESSION_HEADER, session_token(user));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["service"], json!("bridge-mcp-server"));
}

#[tokio::test]
async fn test_bridge_crud_redacts_secrets() {
    let (app, resources) = app();

    let (status, created) = send(
        &app,
        "POST",
        "/api/bridges",
        Some(OWNER_ID),
        Some(posts_definition("https://api.example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], json!("posts"));
    assert_eq!(created["auth"]["token"], json!("********"));
    assert_eq!(created["mcpPath"], json!("/mcp/posts"));
    assert!(!created.to_string().contains(UPSTREAM_TOKEN));

    let stored = resources.bridges.get_by_id("posts").await.unwrap().unwrap();
    assert_eq!(stored.user_id, OWNER_ID);

    let (status, listed) = send(&app, "GET", "/api/bridges", Some(OWNER_ID), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], json!(1));

    let (status, _) = send(&app, "GET", "/api/bridges/posts", Some(STRANGER_ID), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut update = posts_definition("https://api.example.com/v2");
    update["auth"]["token"] = json!("********");
    update["name"] = json!("Renamed");
    let (status, updated) = send(&app, "PUT", "/api/bridges/posts", Some(OWNER_ID), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], json!("Renamed"));

    let (status, _) = send(&app, "DELETE", "/api/bridges/posts", Some(OWNER_ID), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(resources.bridges.get_by_id("posts").await.unwrap().is_none());
}

#[tokio::test]
async fn test_management_requires_session() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/api/bridges", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_object());
}

#[tokio::test]
async fn test_invalid_descriptor_is_rejected() {
    let (app, _) = app();
    let mut definition = posts_definition("https://api.example.com");
    definition["endpoints"][1]["parameters"] = json!([]);

    let (status, _) = send(&app, "POST", "/api/bridges", Some(OWNER_ID), Some(definition)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_bridge_id_conflicts() {
    let (app, _) = app();
    let definition = posts_definition("https://api.example.com");
    let (status, _) = send(&app, "POST", "/api/bridges", Some(OWNER_ID), Some(definition.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/api/bridges", Some(OWNER_ID), Some(definition)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_token_lifecycle_over_http() {
    let (app, resources) = app();
    send(
        &app,
        "POST",
        "/api/bridges",
        Some(OWNER_ID),
        Some(posts_definition("https://api.example.com")),
    )
    .await;

    let (status, issued) = send(
        &app,
        "POST",
        "/api/bridges/posts/tokens",
        Some(OWNER_ID),
        Some(json!({"name": "ci", "permissions": [{"type": "tools", "actions": ["list"]}]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let secret = issued["token"].as_str().unwrap().to_owned();
    assert!(secret.starts_with("mcpb_"));
    assert!(issued.get("secretHash").is_none());
    let token_id = issued["id"].as_str().unwrap().to_owned();

    let rpc_body = json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"});
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/posts")
        .header("authorization", format!("Bearer {secret}"))
        .header("content-type", "application/json")
        .body(Body::from(rpc_body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, listed) = send(&app, "GET", "/api/bridges/posts/tokens", Some(OWNER_ID), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], json!(1));
    assert!(!listed.to_string().contains(&secret));

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/bridges/posts/tokens/{token_id}"),
        Some(OWNER_ID),
        Some(json!({"isActive": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isActive"], json!(false));

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/bridges/posts/tokens/{token_id}"),
        Some(OWNER_ID),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(resources.tokens.find_by_bridge("posts").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mcp_endpoint_statuses() {
    let (app, _) = app();
    send(
        &app,
        "POST",
        "/api/bridges",
        Some(OWNER_ID),
        Some(posts_definition("https://api.example.com")),
    )
    .await;

    let request = Request::builder()
        .method("POST")
        .uri("/mcp/posts")
        .body(Body::from(r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["error"]["code"], json!(-32001));

    let request = Request::builder()
        .method("POST")
        .uri("/mcp/unknown")
        .body(Body::from(r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "POST", "/mcp/posts", Some(OWNER_ID), Some(json!("not an object"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], json!(-32600));
}

#[tokio::test]
async fn test_oversized_mcp_body_is_jsonrpc_error() {
    let mut config = test_config();
    config.max_body_bytes = 64;
    let resources = Arc::new(ServerResources::new(config).unwrap());
    let app = BridgeMcpServer::router(&resources);

    let padding = "x".repeat(256);
    let body = json!({"jsonrpc": "2.0", "id": 1, "method": "ping", "params": {"pad": padding}});
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/posts")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["jsonrpc"], json!("2.0"));
    assert_eq!(body["error"]["code"], json!(-32600));
    assert_eq!(body["id"], Value::Null);
}
