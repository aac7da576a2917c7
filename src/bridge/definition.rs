// ABOUTME: Conversion of owner-supplied bridge definitions into stored configurations
// ABOUTME: Validates ids, base URLs and descriptors, seals secrets and redacts them for display
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::convert::Infallible;

use bridge_core::{AuthConfig, BridgeConfiguration, BridgeDefinition, SealedSecret};
use chrono::Utc;
use url::Url;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::security::SecretEncryptionManager;

/// Placeholder shown instead of a stored secret
///
/// Submitting it back on update keeps the stored secret unchanged.
pub const REDACTED_SECRET: &str = "********";

const MAX_BRIDGE_ID_LEN: usize = 64;

/// Validate and seal a definition into a storable configuration
///
/// When `existing` is given, its id, owner and creation time are kept and
/// redacted secrets are carried over from it.
///
/// # Errors
///
/// Returns an invalid-input error for an empty name, malformed id, non-HTTP
/// base URL, descriptor violation or a redacted secret with nothing to keep;
/// returns an encryption error if sealing fails
pub fn build_configuration(
    definition: BridgeDefinition,
    user_id: &str,
    encryption: &SecretEncryptionManager,
    existing: Option<&BridgeConfiguration>,
) -> AppResult<BridgeConfiguration> {
    let name = definition.name.trim();
    if name.is_empty() {
        return Err(AppError::invalid_input("Bridge name must not be empty"));
    }
    validate_base_url(&definition.base_url)?;
    if definition.timeout_ms == Some(0) {
        return Err(AppError::invalid_input("timeoutMs must be greater than zero"));
    }

    let now = Utc::now();
    let (id, owner, created_at) = match existing {
        Some(current) => (current.id.clone(), current.user_id.clone(), current.created_at),
        None => {
            let id = definition
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            validate_bridge_id(&id)?;
            (id, user_id.to_owned(), now)
        }
    };

    let auth = seal_auth(
        definition.auth,
        existing.map(|current| &current.auth),
        encryption,
    )?;

    let bridge = BridgeConfiguration {
        id,
        user_id: owner,
        name: name.to_owned(),
        description: definition.description,
        enabled: definition.enabled,
        base_url: definition.base_url.trim().to_owned(),
        auth,
        headers: definition.headers,
        access: definition.access,
        endpoints: definition.endpoints,
        timeout_ms: definition.timeout_ms,
        created_at,
        updated_at: now,
    };
    bridge.validate_endpoints()?;
    Ok(bridge)
}

fn validate_bridge_id(id: &str) -> AppResult<()> {
    let well_formed = !id.is_empty()
        && id.len() <= MAX_BRIDGE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!(
            "Bridge id '{id}' must be 1-{MAX_BRIDGE_ID_LEN} characters of [A-Za-z0-9_-]"
        )))
    }
}

fn validate_base_url(raw: &str) -> AppResult<()> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::invalid_input(format!("Invalid baseUrl '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::invalid_input("baseUrl must use http or https"));
    }
    if url.host_str().is_none() {
        return Err(AppError::invalid_input("baseUrl must include a host"));
    }
    Ok(())
}

fn seal_auth(
    incoming: AuthConfig<String>,
    existing: Option<&AuthConfig<SealedSecret>>,
    encryption: &SecretEncryptionManager,
) -> AppResult<AuthConfig<SealedSecret>> {
    match (incoming, existing) {
        (AuthConfig::Bearer { token }, Some(AuthConfig::Bearer { token: kept }))
            if token == REDACTED_SECRET =>
        {
            Ok(AuthConfig::Bearer {
                token: kept.clone(),
            })
        }
        (
            AuthConfig::ApiKey {
                key,
                location,
                param_name,
            },
            Some(AuthConfig::ApiKey { key: kept, .. }),
        ) if key == REDACTED_SECRET => Ok(AuthConfig::ApiKey {
            key: kept.clone(),
            location,
            param_name,
        }),
        (AuthConfig::Basic { username, password }, Some(AuthConfig::Basic { password: kept, .. }))
            if password == REDACTED_SECRET =>
        {
            Ok(AuthConfig::Basic {
                username,
                password: kept.clone(),
            })
        }
        (incoming, _) => incoming.try_map_secrets(|secret| {
            if secret == REDACTED_SECRET {
                return Err(AppError::invalid_input(
                    "Redacted secret supplied but no stored secret of that scheme exists",
                ));
            }
            encryption.seal(&secret)
        }),
    }
}

/// Auth configuration with every secret replaced by [`REDACTED_SECRET`]
#[must_use]
pub fn redacted_auth(auth: &AuthConfig<SealedSecret>) -> AuthConfig<&'static str> {
    match auth
        .clone()
        .try_map_secrets(|_| Ok::<_, Infallible>(REDACTED_SECRET))
    {
        Ok(redacted) => redacted,
        Err(never) => match never {},
    }
}
