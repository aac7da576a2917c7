// ABOUTME: Model Context Protocol layer of the bridge server
// ABOUTME: Schema types, tool catalog, access gate, dispatcher, shared resources and HTTP server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Access control gate for MCP calls
pub mod access;
/// Tool, prompt and resource catalog derived from a bridge
pub mod catalog;
/// JSON-RPC request dispatcher
pub mod dispatcher;
/// Shared server resources
pub mod resources;
/// MCP wire types
pub mod schema;
/// HTTP server assembly
pub mod server;
