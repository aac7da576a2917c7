// ABOUTME: Main library entry point for the MCP bridge server
// ABOUTME: Exposes declaratively configured REST APIs as MCP tools over JSON-RPC 2.0
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Bridge MCP Server
//!
//! A Model Context Protocol (MCP) server that turns stored REST API
//! descriptions ("bridges") into MCP tools. An AI agent talks JSON-RPC 2.0
//! to `POST /mcp/{bridge_id}`; each `tools/call` becomes exactly one
//! outbound HTTP request to the bridge's upstream API, with arguments placed
//! into the path, query or body and the bridge's credentials injected.
//!
//! ## Features
//!
//! - **Tool catalog**: one tool per enabled endpoint, with a JSON Schema input
//! - **Request translation**: path placeholders, query strings, JSON and form bodies
//! - **Upstream auth**: bearer, API key (header or query) and HTTP basic
//! - **Access control**: public bridges, owner sessions and scoped access tokens
//! - **Management API**: owner-facing CRUD for bridges and tokens
//!
//! ## Architecture
//!
//! - **`bridge`**: argument validation, request building, auth injection,
//!   HTTP execution and response translation
//! - **`mcp`**: schema types, catalog, access gate, dispatcher and server
//! - **`database`**: store traits with in-memory implementations
//! - **`routes`**: HTTP route handlers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bridge_mcp_server::config::environment::ServerConfig;
//! use bridge_mcp_server::errors::AppResult;
//! use bridge_mcp_server::mcp::resources::ServerResources;
//! use bridge_mcp_server::mcp::server::BridgeMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let port = config.http_port;
//!     let resources = Arc::new(ServerResources::new(config)?);
//!     BridgeMcpServer::new(resources).run(port).await
//! }
//! ```

/// Owner session resolution
pub mod auth;

/// Bridge execution pipeline from tool arguments to MCP results
pub mod bridge;

/// Configuration management
pub mod config;

/// Application constants
pub mod constants;

/// Bridge and token storage
pub mod database;

/// Unified error handling
pub mod errors;

/// JSON-RPC 2.0 envelope types
pub mod jsonrpc;

/// Structured logging setup
pub mod logging;

/// Model Context Protocol server
pub mod mcp;

/// HTTP middleware (request id, CORS)
pub mod middleware;

/// Request rate limiting
pub mod rate_limiting;

/// HTTP route handlers
pub mod routes;

/// Secret sealing, cookies and the bridge activity log
pub mod security;

/// Access token issuance and updates
pub mod tokens;
