// ABOUTME: Application constants shared across the bridge server
// ABOUTME: JSON-RPC codes, protocol versions, header names and configuration defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants grouped by concern

/// Protocol versions and identifiers
pub mod protocol {
    /// JSON-RPC version string
    pub const JSONRPC_VERSION: &str = "2.0";

    /// MCP protocol revision reported by `initialize`
    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

    /// Version reported in `serverInfo`
    pub const BRIDGE_SERVER_VERSION: &str = "1.0.0";

    /// URI scheme of MCP resources exposed by a bridge
    pub const RESOURCE_URI_SCHEME: &str = "bridge://";

    /// MIME type of every bridge resource
    pub const RESOURCE_MIME_TYPE: &str = "application/json";
}

/// JSON-RPC error codes
pub mod errors {
    /// Invalid JSON was received
    pub const ERROR_PARSE: i32 = -32700;
    /// The JSON sent is not a valid request object
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
    /// The method does not exist
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters
    pub const ERROR_INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error
    pub const ERROR_INTERNAL_ERROR: i32 = -32603;
    /// Caller exceeded its rate limit
    pub const ERROR_RATE_LIMITED: i32 = -32000;
    /// Bridge not found or caller unauthorized
    pub const ERROR_UNAUTHORIZED: i32 = -32001;
}

/// Access token format
pub mod tokens {
    /// Prefix of every issued access token
    pub const TOKEN_PREFIX: &str = "mcpb_";
    /// Random bytes in a token secret
    pub const TOKEN_SECRET_BYTES: usize = 32;
    /// Characters of the secret kept for display
    pub const TOKEN_DISPLAY_PREFIX_LEN: usize = 8;
}

/// Header and cookie names
pub mod headers {
    /// Session cookie carrying the owner JWT
    pub const SESSION_COOKIE: &str = "bridge_session";
    /// Header alternative to the session cookie
    pub const SESSION_HEADER: &str = "x-session-token";
    /// Request correlation header
    pub const REQUEST_ID_HEADER: &str = "x-request-id";
}

/// Tool catalog limits
pub mod catalog {
    /// Maximum length of a generated tool name
    pub const MAX_TOOL_NAME_LEN: usize = 64;
    /// Name used when sanitizing leaves nothing
    pub const FALLBACK_TOOL_NAME: &str = "tool";
}

/// Configuration defaults
pub mod defaults {
    /// Bind address
    pub const HOST: &str = "127.0.0.1";
    /// HTTP port
    pub const HTTP_PORT: u16 = 8081;
    /// Upstream request timeout
    pub const UPSTREAM_TIMEOUT_MS: u64 = 30_000;
    /// Requests per minute per caller and bridge
    pub const RATE_LIMIT_PER_MINUTE: u32 = 120;
    /// Inbound request body limit
    pub const MAX_BODY_BYTES: usize = 1024 * 1024;
    /// Upstream response body kept before truncation
    pub const MAX_UPSTREAM_BODY_BYTES: usize = 256 * 1024;
    /// Log level when neither `RUST_LOG` nor `BRIDGE_LOG_LEVEL` is set
    pub const LOG_LEVEL: &str = "info";
    /// Session lifetime for tokens minted by the server
    pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;
    /// Entries retained by the in-memory log sink
    pub const LOG_SINK_CAPACITY: usize = 1000;
    /// How often expired rate-limit windows are dropped
    pub const RATE_LIMIT_PURGE_INTERVAL_SECS: u64 = 60;
}

/// Service names used in logs and health output
pub mod service_names {
    /// This service
    pub const BRIDGE_MCP_SERVER: &str = "bridge-mcp-server";
}
