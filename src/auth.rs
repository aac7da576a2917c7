// ABOUTME: Owner session resolution for the MCP endpoint and management API
// ABOUTME: HS256 JWT sessions read from the bridge_session cookie or X-Session-Token header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Resolution
//!
//! A session identifies the user who owns bridges. Login itself lives outside
//! this server; the server only verifies the signed session token it is
//! handed and extracts the user id from its `sub` claim.

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::headers::{SESSION_COOKIE, SESSION_HEADER};
use crate::errors::{AppError, AppResult};
use crate::security::cookies::get_cookie_value;

/// Authenticated owner session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// User id from the token subject
    pub user_id: String,
}

/// Resolves the owner session of an inbound request
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Session carried by `headers`, if any and valid
    async fn resolve(&self, headers: &HeaderMap) -> Option<Session>;
}

/// Session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Resolver verifying HS256 session tokens
pub struct JwtSessionResolver {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionResolver {
    /// Create a resolver for tokens signed with `secret`
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Sign a session token for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an internal error if signing fails
    pub fn issue(&self, user_id: &str, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.to_owned(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign session token: {e}")))
    }

    /// Verify a session token
    ///
    /// # Errors
    ///
    /// Returns an auth error if the signature, algorithm or expiry is invalid
    pub fn verify(&self, token: &str) -> AppResult<Session> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::auth_invalid(format!("Invalid session token: {e}")))?;
        if data.claims.sub.is_empty() {
            return Err(AppError::auth_invalid("Session token has empty subject"));
        }
        Ok(Session {
            user_id: data.claims.sub,
        })
    }
}

/// Session token from the cookie, falling back to the header
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    get_cookie_value(headers, SESSION_COOKIE).or_else(|| {
        headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
    })
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Option<Session> {
        let token = extract_session_token(headers)?;
        match self.verify(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                debug!(error = %e.message, "Ignoring invalid session token");
                None
            }
        }
    }
}

/// Resolver used when session auth is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSessionResolver;

#[async_trait]
impl SessionResolver for NoSessionResolver {
    async fn resolve(&self, _headers: &HeaderMap) -> Option<Session> {
        None
    }
}
