// ABOUTME: Route module organization for the bridge server HTTP endpoints
// ABOUTME: Health, per-bridge MCP endpoint and the owner-facing management API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the MCP bridge server
//!
//! Each domain module contains only route definitions and thin handlers
//! that delegate to the dispatcher, stores and token helpers.
//!
//! The management API is compiled only with the `management-api` feature.

// ═══════════════════════════════════════════════════════════════
// ALWAYS ENABLED - Core infrastructure
// ═══════════════════════════════════════════════════════════════

/// Health check route
pub mod health;

/// Per-bridge JSON-RPC endpoint
pub mod mcp;

// ═══════════════════════════════════════════════════════════════
// MANAGEMENT API
// ═══════════════════════════════════════════════════════════════

/// Bridge configuration CRUD
#[cfg(feature = "management-api")]
pub mod bridges;

/// Access token CRUD
#[cfg(feature = "management-api")]
pub mod tokens;

// ═══════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use health::HealthRoutes;
pub use mcp::McpRoutes;

#[cfg(feature = "management-api")]
pub use bridges::BridgeRoutes;

#[cfg(feature = "management-api")]
pub use tokens::TokenRoutes;
