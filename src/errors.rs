// ABOUTME: Unified error handling for the bridge server
// ABOUTME: ErrorCode taxonomy with HTTP status and JSON-RPC code mappings, plus AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Error Handling
//!
//! Every fallible operation in the library returns [`AppResult`]. An
//! [`AppError`] carries a machine-readable [`ErrorCode`] and a human message.
//! The code decides both the HTTP status used by the management API and the
//! JSON-RPC error code used by the MCP dispatcher, so a single error value can
//! be surfaced on either transport without ad-hoc mapping at the call site.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_core::DescriptorError;
use serde::Serialize;
use serde_json::json;

use crate::constants::errors::{
    ERROR_INTERNAL_ERROR, ERROR_INVALID_PARAMS, ERROR_RATE_LIMITED, ERROR_UNAUTHORIZED,
};

/// Machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input failed validation
    InvalidInput,
    /// A required field or argument was absent
    MissingRequiredField,
    /// Input was present but malformed
    InvalidFormat,
    /// Referenced resource does not exist
    ResourceNotFound,
    /// Resource already exists
    ResourceConflict,
    /// Caller supplied no credential
    AuthRequired,
    /// Credential was rejected
    AuthInvalid,
    /// Credential has expired
    AuthExpired,
    /// Credential is valid but lacks the permission
    PermissionDenied,
    /// Caller exceeded its request budget
    RateLimitExceeded,
    /// Upstream API could not be reached
    ExternalServiceError,
    /// Upstream API did not answer in time
    ExternalServiceTimeout,
    /// Server configuration is invalid
    ConfigError,
    /// Secret sealing or opening failed
    EncryptionError,
    /// Unexpected internal fault
    InternalError,
    /// Backing store failed
    StorageError,
}

impl ErrorCode {
    /// HTTP status used when the error is returned over REST
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::InvalidFormat => 400,
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired => 401,
            Self::PermissionDenied => 403,
            Self::ResourceNotFound => 404,
            Self::ResourceConflict => 409,
            Self::RateLimitExceeded => 429,
            Self::ExternalServiceError => 502,
            Self::ExternalServiceTimeout => 504,
            Self::ConfigError
            | Self::EncryptionError
            | Self::InternalError
            | Self::StorageError => 500,
        }
    }

    /// JSON-RPC error code used when the error is returned by the dispatcher
    #[must_use]
    pub const fn jsonrpc_code(self) -> i32 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::InvalidFormat => {
                ERROR_INVALID_PARAMS
            }
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired | Self::PermissionDenied => {
                ERROR_UNAUTHORIZED
            }
            Self::RateLimitExceeded => ERROR_RATE_LIMITED,
            Self::ResourceNotFound
            | Self::ResourceConflict
            | Self::ExternalServiceError
            | Self::ExternalServiceTimeout
            | Self::ConfigError
            | Self::EncryptionError
            | Self::InternalError
            | Self::StorageError => ERROR_INTERNAL_ERROR,
        }
    }

    /// Whether the message may be shown to the caller verbatim
    ///
    /// Infrastructure faults are reported with a generic message; the detail
    /// stays in the server log.
    #[must_use]
    pub const fn is_client_facing(self) -> bool {
        !matches!(
            self,
            Self::ConfigError | Self::EncryptionError | Self::InternalError | Self::StorageError
        )
    }

    /// Short description used when the detailed message is withheld
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::MissingRequiredField => "Missing required field",
            Self::InvalidFormat => "Invalid format",
            Self::ResourceNotFound => "Resource not found",
            Self::ResourceConflict => "Resource already exists",
            Self::AuthRequired => "Authentication required",
            Self::AuthInvalid => "Authentication failed",
            Self::AuthExpired => "Authentication expired",
            Self::PermissionDenied => "Permission denied",
            Self::RateLimitExceeded => "Rate limit exceeded",
            Self::ExternalServiceError => "External service error",
            Self::ExternalServiceTimeout => "External service timeout",
            Self::ConfigError => "Configuration error",
            Self::EncryptionError => "Encryption error",
            Self::InternalError => "Internal error",
            Self::StorageError => "Storage error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Application error with code and message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Machine-readable code
    pub code: ErrorCode,
    /// Human-readable detail
    pub message: String,
}

/// Result alias used across the crate
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create an error with an explicit code
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Input failed validation
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required field missing
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required field: {field}"),
        )
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Resource already exists
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceConflict, message)
    }

    /// No credential supplied
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Authentication required")
    }

    /// Credential rejected
    #[must_use]
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Rate limit exceeded
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, message)
    }

    /// Upstream failure
    #[must_use]
    pub fn external_service(service: &str, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{service}: {}", message.into()),
        )
    }

    /// Invalid configuration
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Sealing or opening a secret failed
    #[must_use]
    pub fn encryption(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EncryptionError, message)
    }

    /// Backing store failure
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Unexpected internal fault
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Message safe to return to the caller
    #[must_use]
    pub fn public_message(&self) -> &str {
        if self.code.is_client_facing() {
            &self.message
        } else {
            self.code.description()
        }
    }
}

impl From<DescriptorError> for AppError {
    fn from(error: DescriptorError) -> Self {
        Self::invalid_input(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::InvalidFormat, format!("Invalid JSON: {error}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if !self.code.is_client_facing() {
            tracing::error!(code = ?self.code, error = %self.message, "Request failed");
        }
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.public_message(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonrpc_mapping() {
        assert_eq!(ErrorCode::MissingRequiredField.jsonrpc_code(), -32602);
        assert_eq!(ErrorCode::AuthInvalid.jsonrpc_code(), -32001);
        assert_eq!(ErrorCode::ExternalServiceTimeout.jsonrpc_code(), -32603);
        assert_eq!(ErrorCode::RateLimitExceeded.jsonrpc_code(), -32000);
    }

    #[test]
    fn test_internal_detail_withheld() {
        let error = AppError::encryption("aead open failed for key v1");
        assert_eq!(error.public_message(), "Encryption error");

        let error = AppError::invalid_input("limit must be a number");
        assert_eq!(error.public_message(), "limit must be a number");
    }

    #[tokio::test]
    async fn test_into_response_status() {
        let response = AppError::not_found("Bridge").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::conflict("exists").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
