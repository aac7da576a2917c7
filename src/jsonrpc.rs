// ABOUTME: JSON-RPC 2.0 envelope types and request validation
// ABOUTME: Parses untyped request values into JsonRpcRequest and builds responses and errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # JSON-RPC 2.0 Foundation
//!
//! Requests are validated by hand from a [`serde_json::Value`] rather than by
//! deriving `Deserialize`, because the dispatcher must report *which* envelope
//! rule failed and must still echo a usable `id` when only part of the
//! envelope is valid.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::errors::{ERROR_INVALID_PARAMS, ERROR_INVALID_REQUEST};
use crate::constants::protocol::JSONRPC_VERSION;
use crate::errors::AppError;

/// Method prefix for notifications, which may omit `id`
pub const NOTIFICATION_PREFIX: &str = "notifications/";

/// A validated JSON-RPC request
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Method name
    pub method: String,
    /// Object parameters; empty when absent
    pub params: Map<String, Value>,
    /// Request id (`Null` for notifications)
    pub id: Value,
    /// Whether the request arrived without an `id`
    pub is_notification: bool,
}

/// Why an envelope was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeError {
    /// Id to echo (`Null` when the id itself was unusable)
    pub id: Value,
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: &'static str,
}

impl EnvelopeError {
    const fn invalid_request(id: Value, message: &'static str) -> Self {
        Self {
            id,
            code: ERROR_INVALID_REQUEST,
            message,
        }
    }

    /// Convert into the response sent to the caller
    #[must_use]
    pub fn into_response(self) -> JsonRpcResponse {
        JsonRpcResponse::error(self.id, JsonRpcError::new(self.code, self.message))
    }
}

impl JsonRpcRequest {
    /// Validate an untyped value as a JSON-RPC 2.0 request
    ///
    /// # Errors
    ///
    /// Returns an [`EnvelopeError`] naming the first rule the value breaks
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let mut object = match value {
            Value::Object(object) => object,
            Value::Array(_) => {
                return Err(EnvelopeError::invalid_request(
                    Value::Null,
                    "Batch requests are not supported",
                ))
            }
            _ => {
                return Err(EnvelopeError::invalid_request(
                    Value::Null,
                    "Request must be a JSON object",
                ))
            }
        };

        let raw_id = object.remove("id");
        let id = match &raw_id {
            None | Some(Value::Null) => Value::Null,
            Some(id @ (Value::Number(_) | Value::String(_))) => id.clone(),
            Some(_) => {
                return Err(EnvelopeError::invalid_request(
                    Value::Null,
                    "Request id must be a number, string or null",
                ))
            }
        };

        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(EnvelopeError::invalid_request(
                id,
                "jsonrpc must be exactly \"2.0\"",
            ));
        }

        let Some(Value::String(method)) = object.remove("method") else {
            return Err(EnvelopeError::invalid_request(
                id,
                "method must be a string",
            ));
        };
        if method.is_empty() {
            return Err(EnvelopeError::invalid_request(id, "method must not be empty"));
        }

        let is_notification = raw_id.is_none();
        if is_notification && !method.starts_with(NOTIFICATION_PREFIX) {
            return Err(EnvelopeError::invalid_request(
                Value::Null,
                "id is required for requests",
            ));
        }

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => {
                return Err(EnvelopeError {
                    id,
                    code: ERROR_INVALID_PARAMS,
                    message: "params must be an object",
                })
            }
        };

        Ok(Self {
            method,
            params,
            id,
            is_notification,
        })
    }

    /// String parameter by name
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Optional structured detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Error without data
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<&AppError> for JsonRpcError {
    fn from(error: &AppError) -> Self {
        Self::new(error.code.jsonrpc_code(), error.public_message())
    }
}

/// JSON-RPC response carrying either a result or an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Echoed request id
    pub id: Value,
}

impl JsonRpcResponse {
    /// Successful response
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response
    #[must_use]
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Whether this response carries an error
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
