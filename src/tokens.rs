// ABOUTME: Access token issuance, hashing and request DTOs for token management
// ABOUTME: Secrets come from the OS CSPRNG and only their SHA-256 digest is stored
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Access Tokens
//!
//! A token secret is `mcpb_` followed by 32 random bytes in URL-safe base64.
//! The plaintext is handed to the caller exactly once at issuance; the store
//! keeps a SHA-256 hex digest for lookup and an 8-character prefix for display.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bridge_core::{AccessToken, Permission};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::constants::tokens::{TOKEN_DISPLAY_PREFIX_LEN, TOKEN_PREFIX, TOKEN_SECRET_BYTES};
use crate::errors::{AppError, AppResult};

/// Freshly generated token secret
pub struct GeneratedSecret {
    /// Plaintext, shown once
    pub plaintext: Zeroizing<String>,
    /// SHA-256 hex digest
    pub hash: String,
    /// Display prefix
    pub prefix: String,
}

/// Generate a new token secret
#[must_use]
pub fn generate_secret() -> GeneratedSecret {
    let mut bytes = Zeroizing::new([0u8; TOKEN_SECRET_BYTES]);
    OsRng.fill_bytes(&mut bytes[..]);
    let plaintext = Zeroizing::new(format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(&bytes[..])));
    GeneratedSecret {
        hash: hash_secret(&plaintext),
        prefix: display_prefix(&plaintext),
        plaintext,
    }
}

/// SHA-256 hex digest of a token secret
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// First characters of a secret, for display and rate-limit keys
#[must_use]
pub fn display_prefix(secret: &str) -> String {
    secret.chars().take(TOKEN_DISPLAY_PREFIX_LEN).collect()
}

/// Body of `POST /api/bridges/:bridge_id/tokens`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenRequest {
    /// Human name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Granted permissions
    pub permissions: Vec<Permission>,
    /// Optional expiry
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of `PATCH /api/bridges/:bridge_id/tokens/:token_id`
///
/// Absent fields are left unchanged; `expiresAt: null` clears the expiry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokenRequest {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    /// Replacement permission set
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
    /// New expiry
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    /// Activate or deactivate
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Issuance response: the stored token plus its plaintext secret
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// Stored token view
    #[serde(flatten)]
    pub access_token: AccessToken,
    /// Plaintext secret, never retrievable again
    pub token: String,
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::invalid_input("Token name must not be empty"));
    }
    Ok(())
}

/// Build a new token for `bridge_id` and return it with its plaintext
///
/// # Errors
///
/// Returns an invalid-input error if the name is empty, no permission is
/// granted, or the expiry is already in the past
pub fn issue_token(
    bridge_id: &str,
    request: CreateTokenRequest,
) -> AppResult<(AccessToken, Zeroizing<String>)> {
    validate_name(&request.name)?;
    if request.permissions.is_empty() {
        return Err(AppError::invalid_input(
            "At least one permission is required",
        ));
    }
    let now = Utc::now();
    if request.expires_at.is_some_and(|expires_at| expires_at <= now) {
        return Err(AppError::invalid_input("expiresAt must be in the future"));
    }

    let secret = generate_secret();
    let token = AccessToken {
        id: Uuid::new_v4(),
        bridge_id: bridge_id.to_owned(),
        name: request.name.trim().to_owned(),
        description: request.description,
        token_prefix: secret.prefix,
        secret_hash: secret.hash,
        permissions: request.permissions,
        expires_at: request.expires_at,
        is_active: true,
        last_used_at: None,
        created_at: now,
    };
    Ok((token, secret.plaintext))
}

/// Apply a partial update to `token`
///
/// # Errors
///
/// Returns an invalid-input error if the new name is empty or the new
/// permission set is empty
pub fn apply_update(token: &mut AccessToken, update: UpdateTokenRequest) -> AppResult<()> {
    if let Some(name) = update.name {
        validate_name(&name)?;
        token.name = name.trim().to_owned();
    }
    if let Some(description) = update.description {
        token.description = description;
    }
    if let Some(permissions) = update.permissions {
        if permissions.is_empty() {
            return Err(AppError::invalid_input(
                "At least one permission is required",
            ));
        }
        token.permissions = permissions;
    }
    if let Some(expires_at) = update.expires_at {
        token.expires_at = expires_at;
    }
    if let Some(is_active) = update.is_active {
        token.is_active = is_active;
    }
    Ok(())
}
