// ABOUTME: JSON-RPC dispatcher for per-bridge MCP requests
// ABOUTME: Resolves the bridge, validates the envelope, rate limits, authorizes and routes by method
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # MCP Dispatcher
//!
//! Every request walks the same stages and every stage ends in exactly one
//! JSON-RPC response:
//!
//! | Stage                | Failure                     | HTTP | JSON-RPC |
//! |----------------------|-----------------------------|------|----------|
//! | bridge lookup        | unknown or disabled bridge  | 404  | `-32001` |
//! | body parse           | malformed JSON              | 200  | `-32700` |
//! | envelope validation  | bad shape                   | 200  | `-32600` |
//! | rate limit           | over the limit              | 429  | `-32000` |
//! | access gate          | denied                      | 401  | `-32001` |
//! | token rate limit     | admitted token over limit   | 429  | `-32000` |
//! | method routing       | unknown method              | 200  | `-32601` |
//!
//! Panics anywhere below [`McpDispatcher::dispatch`] are caught and reported
//! as `-32603` with HTTP 200.

use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, StatusCode};
use bridge_core::{BridgeConfiguration, BridgeLogEntry, BridgeLogLevel, CapabilityType};
use futures_util::FutureExt;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use super::access::{authorize, extract_bearer, Caller, RequiredAccess};
use super::catalog::ToolCatalog;
use super::resources::ServerResources;
use super::schema::InitializeResult;
use crate::auth::Session;
use crate::bridge::arguments::validate_arguments;
use crate::bridge::auth_injector::inject_auth;
use crate::bridge::executor::ExecutionOutcome;
use crate::bridge::request::build_request;
use crate::bridge::response::translate_outcome;
use crate::constants::errors::{
    ERROR_INTERNAL_ERROR, ERROR_INVALID_PARAMS, ERROR_METHOD_NOT_FOUND, ERROR_PARSE,
    ERROR_RATE_LIMITED, ERROR_UNAUTHORIZED,
};
use crate::jsonrpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, NOTIFICATION_PREFIX};
use crate::security::audit::record_detached;

const NOT_FOUND_OR_DENIED: &str = "Bridge not found or access denied";

/// MCP methods the bridge understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    /// `initialize`
    Initialize,
    /// `ping`
    Ping,
    /// Any `notifications/*` method
    Notification,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
    /// `prompts/list`
    PromptsList,
    /// `prompts/get`
    PromptsGet,
    /// `resources/list`
    ResourcesList,
    /// `resources/read`
    ResourcesRead,
    /// Anything else
    Unknown,
}

impl McpMethod {
    /// Classify a method name
    #[must_use]
    pub fn parse(method: &str) -> Self {
        match method {
            "initialize" => Self::Initialize,
            "ping" => Self::Ping,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            "prompts/list" => Self::PromptsList,
            "prompts/get" => Self::PromptsGet,
            "resources/list" => Self::ResourcesList,
            "resources/read" => Self::ResourcesRead,
            other if other.starts_with(NOTIFICATION_PREFIX) => Self::Notification,
            _ => Self::Unknown,
        }
    }

    /// What the caller must hold to invoke this method
    #[must_use]
    pub fn required_access(self, request: &JsonRpcRequest) -> RequiredAccess {
        match self {
            Self::Initialize | Self::Ping | Self::Notification | Self::Unknown => {
                RequiredAccess::Any
            }
            Self::ToolsList => RequiredAccess::capability(CapabilityType::Tools, "list"),
            Self::ToolsCall => {
                RequiredAccess::tool_call(request.param_str("name").map(str::to_owned))
            }
            Self::PromptsList => RequiredAccess::capability(CapabilityType::Prompts, "list"),
            Self::PromptsGet => RequiredAccess::capability(CapabilityType::Prompts, "get"),
            Self::ResourcesList => RequiredAccess::capability(CapabilityType::Resources, "list"),
            Self::ResourcesRead => RequiredAccess::capability(CapabilityType::Resources, "read"),
        }
    }
}

/// Transport-level facts about the inbound request
#[derive(Debug, Clone, Default)]
pub struct CallerContext {
    /// Inbound headers (session cookie, `Authorization`)
    pub headers: HeaderMap,
    /// Peer address, when known
    pub client_addr: Option<SocketAddr>,
}

/// Response and HTTP status for one dispatched request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// HTTP status
    pub status: StatusCode,
    /// JSON-RPC response body
    pub response: JsonRpcResponse,
}

impl DispatchOutcome {
    fn ok(response: JsonRpcResponse) -> Self {
        Self {
            status: StatusCode::OK,
            response,
        }
    }

    fn error(status: StatusCode, id: Value, error: JsonRpcError) -> Self {
        Self {
            status,
            response: JsonRpcResponse::error(id, error),
        }
    }
}

/// Id of a request body, if it can be recovered
fn recover_id(body: &[u8]) -> Value {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("id").cloned())
        .filter(|id| id.is_number() || id.is_string())
        .unwrap_or(Value::Null)
}

fn internal_error() -> JsonRpcError {
    JsonRpcError::new(ERROR_INTERNAL_ERROR, "Internal error")
}

fn invalid_params(message: impl Into<String>) -> JsonRpcError {
    JsonRpcError::new(ERROR_INVALID_PARAMS, message)
}

/// Routes MCP requests for every bridge
#[derive(Clone)]
pub struct McpDispatcher {
    resources: Arc<ServerResources>,
}

impl McpDispatcher {
    /// Dispatcher over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle one request body addressed to `bridge_id`
    ///
    /// Never fails: every outcome, including a panic in a collaborator, is a
    /// well-formed JSON-RPC response.
    pub async fn dispatch(&self, bridge_id: &str, body: &[u8], caller: &CallerContext) -> DispatchOutcome {
        match AssertUnwindSafe(self.dispatch_inner(bridge_id, body, caller))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(bridge_id, "Panic while dispatching MCP request");
                DispatchOutcome::ok(JsonRpcResponse::error(recover_id(body), internal_error()))
            }
        }
    }

    #[tracing::instrument(skip(self, body, caller))]
    async fn dispatch_inner(&self, bridge_id: &str, body: &[u8], caller: &CallerContext) -> DispatchOutcome {
        let started = Instant::now();

        let bridge = match self.resources.bridges.get_by_id(bridge_id).await {
            Ok(Some(bridge)) if bridge.enabled => bridge,
            Ok(_) => {
                debug!("Unknown or disabled bridge");
                return DispatchOutcome::error(
                    StatusCode::NOT_FOUND,
                    Value::Null,
                    JsonRpcError::new(ERROR_UNAUTHORIZED, NOT_FOUND_OR_DENIED),
                );
            }
            Err(e) => {
                error!(error = %e, "Bridge lookup failed");
                return DispatchOutcome::ok(JsonRpcResponse::error(Value::Null, internal_error()));
            }
        };

        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Unparseable JSON-RPC body");
                return DispatchOutcome::ok(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::new(ERROR_PARSE, "Parse error"),
                ));
            }
        };

        let request = match JsonRpcRequest::from_value(value) {
            Ok(request) => request,
            Err(envelope) => {
                debug!(reason = envelope.message, "Invalid JSON-RPC envelope");
                return DispatchOutcome::ok(envelope.into_response());
            }
        };

        let session = self.resources.sessions.resolve(&caller.headers).await;
        let bearer = extract_bearer(&caller.headers);

        let rate_key = rate_limit_key(&bridge.id, session.as_ref(), caller.client_addr);
        if let Some(limited) = self.check_rate_limit(&rate_key, &request) {
            return limited;
        }

        let method = McpMethod::parse(&request.method);
        let required = method.required_access(&request);
        let caller_identity = match authorize(
            &bridge,
            session.as_ref(),
            bearer,
            &required,
            &self.resources.tokens,
        )
        .await
        {
            Ok(admitted) => admitted,
            Err(reason) => {
                warn!(method = %request.method, %reason, "MCP access denied");
                record_detached(
                    &self.resources.log_sink,
                    BridgeLogEntry::new(&bridge.id, BridgeLogLevel::Warning, "Access denied")
                        .with_metadata(json!({
                            "method": request.method,
                            "reason": reason.to_string(),
                        })),
                );
                return DispatchOutcome::error(
                    StatusCode::UNAUTHORIZED,
                    request.id,
                    JsonRpcError::new(ERROR_UNAUTHORIZED, NOT_FOUND_OR_DENIED),
                );
            }
        };

        if let Caller::Token(token) = &caller_identity {
            let token_key = format!("{}:token:{}", bridge.id, token.id);
            if let Some(limited) = self.check_rate_limit(&token_key, &request) {
                return limited;
            }
        }

        let result = self
            .route(method, &bridge, &request, &caller_identity)
            .await;
        debug!(
            method = %request.method,
            caller = %caller_identity.label(),
            ok = result.is_ok(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "MCP request handled"
        );

        DispatchOutcome::ok(match result {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    /// Count one request against `key`, returning the 429 outcome when over the limit
    fn check_rate_limit(&self, key: &str, request: &JsonRpcRequest) -> Option<DispatchOutcome> {
        let decision = self.resources.rate_limiter.check(key);
        if decision.allowed {
            return None;
        }
        warn!(method = %request.method, key, "MCP request rate limited");
        Some(DispatchOutcome::error(
            StatusCode::TOO_MANY_REQUESTS,
            request.id.clone(),
            JsonRpcError::new(ERROR_RATE_LIMITED, "Rate limit exceeded").with_data(json!({
                "limit": decision.limit,
                "resetAt": decision.reset_at,
            })),
        ))
    }

    async fn route(
        &self,
        method: McpMethod,
        bridge: &BridgeConfiguration,
        request: &JsonRpcRequest,
        caller: &Caller,
    ) -> Result<Value, JsonRpcError> {
        let catalog = ToolCatalog::build(bridge);
        match method {
            McpMethod::Initialize => to_result(&InitializeResult::for_bridge(&bridge.name)),
            McpMethod::Ping | McpMethod::Notification => Ok(json!({})),
            McpMethod::ToolsList => {
                let tools: Vec<_> = catalog
                    .tools()
                    .into_iter()
                    .filter(|tool| caller.can_see_tool(&tool.name))
                    .collect();
                Ok(json!({ "tools": tools }))
            }
            McpMethod::ToolsCall => self.call_tool(bridge, &catalog, &request.params, caller).await,
            McpMethod::PromptsList => Ok(json!({ "prompts": catalog.prompts() })),
            McpMethod::PromptsGet => {
                let name = request
                    .param_str("name")
                    .ok_or_else(|| invalid_params("Missing prompt name"))?;
                let arguments = match request.params.get("arguments") {
                    None | Some(Value::Null) => Map::new(),
                    Some(Value::Object(arguments)) => arguments.clone(),
                    Some(_) => return Err(invalid_params("arguments must be an object")),
                };
                let prompt = catalog
                    .prompt(name, &arguments)
                    .map_err(|e| JsonRpcError::from(&e))?;
                to_result(&prompt)
            }
            McpMethod::ResourcesList => Ok(json!({ "resources": catalog.resources() })),
            McpMethod::ResourcesRead => {
                let uri = request
                    .param_str("uri")
                    .ok_or_else(|| invalid_params("Missing resource uri"))?;
                let contents = catalog
                    .read_resource(uri)
                    .map_err(|e| JsonRpcError::from(&e))?;
                Ok(json!({ "contents": [contents] }))
            }
            McpMethod::Unknown => Err(JsonRpcError::new(
                ERROR_METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    async fn call_tool(
        &self,
        bridge: &BridgeConfiguration,
        catalog: &ToolCatalog<'_>,
        params: &Map<String, Value>,
        caller: &Caller,
    ) -> Result<Value, JsonRpcError> {
        let tool_name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_params("Missing tool name"))?;
        let descriptor = catalog.find(tool_name).ok_or_else(|| {
            warn!(tool = tool_name, "tools/call for a tool missing from the catalog");
            JsonRpcError::new(ERROR_INTERNAL_ERROR, format!("Unknown tool: {tool_name}"))
        })?;

        let arguments = validate_arguments(descriptor, params.get("arguments"))
            .map_err(|e| JsonRpcError::from(&e))?;
        let request = build_request(bridge, descriptor, &arguments)
            .map_err(|e| JsonRpcError::from(&e))?;

        let credentials = self
            .resources
            .encryption
            .open_auth(&bridge.auth)
            .map_err(|e| {
                error!(tool = tool_name, error = %e, "Cannot open upstream credentials");
                self.log(
                    bridge,
                    BridgeLogLevel::Error,
                    "Upstream credentials unavailable",
                    json!({ "tool": tool_name }),
                );
                internal_error()
            })?;
        let request = inject_auth(&credentials, request);
        drop(credentials);

        let timeout = bridge
            .timeout_ms
            .map_or(self.resources.config.upstream_timeout, Duration::from_millis);
        let started = Instant::now();
        let outcome = self.resources.executor.execute(request, timeout).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let (level, status) = match &outcome {
            ExecutionOutcome::Success(response) => (BridgeLogLevel::Info, Some(response.status)),
            ExecutionOutcome::HttpError(response) => {
                (BridgeLogLevel::Warning, Some(response.status))
            }
            ExecutionOutcome::Transport(_) | ExecutionOutcome::Timeout(_) => {
                (BridgeLogLevel::Error, None)
            }
        };
        self.log(
            bridge,
            level,
            "Tool call",
            json!({
                "tool": tool_name,
                "method": descriptor.method,
                "outcome": outcome.kind(),
                "status": status,
                "elapsedMs": elapsed_ms,
                "caller": caller.label(),
            }),
        );

        match translate_outcome(outcome) {
            Ok(result) => to_result(&result),
            Err(failure) => {
                error!(
                    tool = tool_name,
                    kind = failure.kind,
                    detail = %failure.detail,
                    "Upstream call failed"
                );
                Err(JsonRpcError::new(ERROR_INTERNAL_ERROR, "Upstream request failed")
                    .with_data(json!({ "kind": failure.kind })))
            }
        }
    }

    fn log(&self, bridge: &BridgeConfiguration, level: BridgeLogLevel, message: &str, metadata: Value) {
        record_detached(
            &self.resources.log_sink,
            BridgeLogEntry::new(&bridge.id, level, message).with_metadata(metadata),
        );
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| {
        error!(error = %e, "Failed to serialize MCP result");
        internal_error()
    })
}

/// Pre-admission rate limit key: bridge id plus session user or client address
///
/// Bearer values are not trusted here; an admitted token is counted again
/// under its own id once the access gate has accepted it.
fn rate_limit_key(bridge_id: &str, session: Option<&Session>, client_addr: Option<SocketAddr>) -> String {
    if let Some(session) = session {
        return format!("{bridge_id}:user:{}", session.user_id);
    }
    match client_addr {
        Some(addr) => format!("{bridge_id}:ip:{}", addr.ip()),
        None => format!("{bridge_id}:anonymous"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(McpMethod::parse("tools/call"), McpMethod::ToolsCall);
        assert_eq!(
            McpMethod::parse("notifications/initialized"),
            McpMethod::Notification
        );
        assert_eq!(McpMethod::parse("non_existent_method"), McpMethod::Unknown);
    }

    #[test]
    fn test_recover_id() {
        assert_eq!(recover_id(br#"{"id": 9}"#), json!(9));
        assert_eq!(recover_id(br#"{"id": {}}"#), Value::Null);
        assert_eq!(recover_id(b"not json"), Value::Null);
    }

    #[test]
    fn test_rate_limit_key_ignores_bearer() {
        let session = Session {
            user_id: "u1".to_owned(),
        };
        let addr: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        assert_eq!(
            rate_limit_key("b1", Some(&session), Some(addr)),
            "b1:user:u1"
        );
        assert_eq!(rate_limit_key("b1", None, Some(addr)), "b1:ip:10.0.0.1");
        assert_eq!(rate_limit_key("b1", None, None), "b1:anonymous");
    }
}
