// ABOUTME: Access control gate deciding who may call a bridge's MCP endpoint
// ABOUTME: Public bridges, owner sessions and scoped bearer access tokens with lastUsedAt touch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Access Control Gate
//!
//! Decision order:
//!
//! 1. a public bridge admits everyone; `authRequired` is stored but not
//!    consulted here
//! 2. a session whose user owns the bridge is admitted
//! 3. a bearer access token for this bridge that is active, unexpired and
//!    covers the requested capability is admitted
//! 4. everything else is denied
//!
//! A [`DenialReason`] is for server-side logs only; callers always see the
//! same generic refusal.

use std::fmt;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use bridge_core::{AccessToken, BridgeConfiguration, CapabilityType};
use chrono::Utc;
use tracing::{debug, warn};

use crate::auth::Session;
use crate::database::TokenStore;

/// What a method needs from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredAccess {
    /// Any valid credential for the bridge
    Any,
    /// A permission covering `action` on `capability`
    Capability {
        /// Capability family
        capability: CapabilityType,
        /// Action within the family
        action: &'static str,
        /// Tool being called, checked against `allowedTools`
        tool: Option<String>,
    },
}

impl RequiredAccess {
    /// Requirement for `action` on `capability`
    #[must_use]
    pub const fn capability(capability: CapabilityType, action: &'static str) -> Self {
        Self::Capability {
            capability,
            action,
            tool: None,
        }
    }

    /// Requirement for calling `tool`
    #[must_use]
    pub const fn tool_call(tool: Option<String>) -> Self {
        Self::Capability {
            capability: CapabilityType::Tools,
            action: "call",
            tool,
        }
    }
}

/// Who was admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// Anonymous caller on a public bridge
    Public,
    /// Bridge owner authenticated by session
    Owner {
        /// Owner user id
        user_id: String,
    },
    /// Holder of a scoped access token
    Token(Box<AccessToken>),
}

impl Caller {
    /// Whether `tools/list` should show `tool` to this caller
    #[must_use]
    pub fn can_see_tool(&self, tool: &str) -> bool {
        match self {
            Self::Public | Self::Owner { .. } => true,
            Self::Token(token) => token.permits_tool("list", tool),
        }
    }

    /// Label for logs
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Public => "public".to_owned(),
            Self::Owner { user_id } => format!("owner:{user_id}"),
            Self::Token(token) => format!("token:{}", token.token_prefix),
        }
    }
}

/// Why a caller was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No session and no bearer token
    NoCredentials,
    /// Session for a user who does not own the bridge
    NotOwner,
    /// Bearer value matches no token
    UnknownToken,
    /// Token belongs to another bridge
    OtherBridge,
    /// Token deactivated
    Inactive,
    /// Token past its expiry
    Expired,
    /// Token lacks the required permission
    InsufficientPermission,
    /// Token store lookup failed
    StoreUnavailable,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoCredentials => "no credentials",
            Self::NotOwner => "session user does not own bridge",
            Self::UnknownToken => "unknown access token",
            Self::OtherBridge => "access token belongs to another bridge",
            Self::Inactive => "access token is inactive",
            Self::Expired => "access token has expired",
            Self::InsufficientPermission => "access token lacks permission",
            Self::StoreUnavailable => "token store unavailable",
        })
    }
}

/// Bearer credential from the `Authorization` header
#[must_use]
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

fn token_covers(token: &AccessToken, required: &RequiredAccess) -> bool {
    match required {
        RequiredAccess::Any => !token.permissions.is_empty(),
        RequiredAccess::Capability {
            capability: CapabilityType::Tools,
            action,
            tool: Some(tool),
        } => token.permits_tool(action, tool),
        RequiredAccess::Capability {
            capability, action, ..
        } => token.permits(*capability, action),
    }
}

/// Decide whether the caller may perform `required` on `bridge`
///
/// On admission by token, the token's `lastUsedAt` is updated in a detached
/// task; a failed update is logged and does not affect the call.
///
/// # Errors
///
/// Returns the [`DenialReason`] when the caller is refused
pub async fn authorize(
    bridge: &BridgeConfiguration,
    session: Option<&Session>,
    bearer: Option<&str>,
    required: &RequiredAccess,
    tokens: &Arc<dyn TokenStore>,
) -> Result<Caller, DenialReason> {
    if bridge.access.public {
        return Ok(Caller::Public);
    }

    if let Some(session) = session {
        if bridge.is_owned_by(&session.user_id) {
            return Ok(Caller::Owner {
                user_id: session.user_id.clone(),
            });
        }
    }

    let Some(secret) = bearer else {
        return Err(if session.is_some() {
            DenialReason::NotOwner
        } else {
            DenialReason::NoCredentials
        });
    };

    let token = match tokens.find_by_secret(secret).await {
        Ok(Some(token)) => token,
        Ok(None) => return Err(DenialReason::UnknownToken),
        Err(e) => {
            warn!(bridge_id = %bridge.id, error = %e, "Token lookup failed");
            return Err(DenialReason::StoreUnavailable);
        }
    };

    let now = Utc::now();
    if token.bridge_id != bridge.id {
        return Err(DenialReason::OtherBridge);
    }
    if !token.is_active {
        return Err(DenialReason::Inactive);
    }
    if token.is_expired_at(now) {
        return Err(DenialReason::Expired);
    }
    if !token_covers(&token, required) {
        return Err(DenialReason::InsufficientPermission);
    }

    let store = Arc::clone(tokens);
    let token_id = token.id;
    tokio::spawn(async move {
        if let Err(e) = store.touch_last_used(token_id).await {
            warn!(%token_id, error = %e, "Failed to update token lastUsedAt");
        }
    });
    debug!(bridge_id = %bridge.id, token_prefix = %token.token_prefix, "Access token admitted");

    Ok(Caller::Token(Box::new(token)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryTokenStore;
    use crate::tokens::{issue_token, CreateTokenRequest};
    use axum::http::HeaderValue;
    use bridge_core::{AccessPolicy, AuthConfig, Permission, PermissionConstraints};
    use chrono::Duration;

    fn bridge(access: AccessPolicy) -> BridgeConfiguration {
        let now = Utc::now();
        BridgeConfiguration {
            id: "b1".to_owned(),
            user_id: "owner".to_owned(),
            name: "Test Bridge".to_owned(),
            description: None,
            enabled: true,
            base_url: "https://api.example.com".to_owned(),
            auth: AuthConfig::None,
            headers: Default::default(),
            access,
            endpoints: vec![],
            timeout_ms: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn private() -> AccessPolicy {
        AccessPolicy {
            public: false,
            auth_required: true,
        }
    }

    async fn store_with(
        bridge_id: &str,
        permissions: Vec<Permission>,
    ) -> (Arc<dyn TokenStore>, String, uuid::Uuid) {
        let store: Arc<dyn TokenStore> = Arc::new(InMemoryTokenStore::new());
        let (token, secret) = issue_token(
            bridge_id,
            CreateTokenRequest {
                name: "agent".to_owned(),
                description: None,
                permissions,
                expires_at: None,
            },
        )
        .unwrap();
        let id = token.id;
        store.create(token).await.unwrap();
        (store, secret.to_string(), id)
    }

    #[tokio::test]
    async fn test_public_bridge_admits_anyone() {
        let (store, _, _) = store_with("b1", vec![]).await;
        let bridge = bridge(AccessPolicy {
            public: true,
            auth_required: false,
        });
        let caller = authorize(&bridge, None, None, &RequiredAccess::tool_call(None), &store)
            .await
            .unwrap();
        assert_eq!(caller, Caller::Public);
    }

    #[tokio::test]
    async fn test_public_bridge_ignores_auth_required() {
        let (store, _, _) = store_with("b1", vec![]).await;
        let bridge = bridge(AccessPolicy {
            public: true,
            auth_required: true,
        });
        let list = RequiredAccess::capability(CapabilityType::Tools, "list");
        assert_eq!(
            authorize(&bridge, None, None, &list, &store).await,
            Ok(Caller::Public)
        );
        assert_eq!(
            authorize(&bridge, None, None, &RequiredAccess::tool_call(None), &store).await,
            Ok(Caller::Public)
        );
    }

    #[tokio::test]
    async fn test_owner_session() {
        let (store, _, _) = store_with("b1", vec![]).await;
        let bridge = bridge(private());
        let owner = Session {
            user_id: "owner".to_owned(),
        };
        let stranger = Session {
            user_id: "stranger".to_owned(),
        };
        assert!(authorize(&bridge, Some(&owner), None, &RequiredAccess::Any, &store)
            .await
            .is_ok());
        assert_eq!(
            authorize(&bridge, Some(&stranger), None, &RequiredAccess::Any, &store).await,
            Err(DenialReason::NotOwner)
        );
    }

    #[tokio::test]
    async fn test_token_permissions_and_touch() {
        let (store, secret, id) =
            store_with("b1", vec![Permission::all(CapabilityType::Tools)]).await;
        let bridge = bridge(private());

        let caller = authorize(
            &bridge,
            None,
            Some(&secret),
            &RequiredAccess::tool_call(Some("get_post".to_owned())),
            &store,
        )
        .await
        .unwrap();
        assert!(matches!(caller, Caller::Token(_)));

        assert_eq!(
            authorize(
                &bridge,
                None,
                Some(&secret),
                &RequiredAccess::capability(CapabilityType::Resources, "read"),
                &store
            )
            .await,
            Err(DenialReason::InsufficientPermission)
        );

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(store.find_by_id(id).await.unwrap().unwrap().last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_allowed_tools_constraint() {
        let permission = Permission {
            capability: CapabilityType::Tools,
            actions: vec!["list".to_owned(), "call".to_owned()],
            constraints: Some(PermissionConstraints {
                allowed_tools: Some(vec!["get_post".to_owned()]),
            }),
        };
        let (store, secret, _) = store_with("b1", vec![permission]).await;
        let bridge = bridge(private());

        let denied = authorize(
            &bridge,
            None,
            Some(&secret),
            &RequiredAccess::tool_call(Some("delete_post".to_owned())),
            &store,
        )
        .await;
        assert_eq!(denied, Err(DenialReason::InsufficientPermission));

        let caller = authorize(
            &bridge,
            None,
            Some(&secret),
            &RequiredAccess::capability(CapabilityType::Tools, "list"),
            &store,
        )
        .await
        .unwrap();
        assert!(caller.can_see_tool("get_post"));
        assert!(!caller.can_see_tool("delete_post"));
    }

    #[tokio::test]
    async fn test_token_state_denials() {
        let (store, secret, _) =
            store_with("other", vec![Permission::all(CapabilityType::Admin)]).await;
        let bridge = bridge(private());
        assert_eq!(
            authorize(&bridge, None, Some(&secret), &RequiredAccess::Any, &store).await,
            Err(DenialReason::OtherBridge)
        );

        let (store, secret, id) =
            store_with("b1", vec![Permission::all(CapabilityType::Admin)]).await;
        let mut token = store.find_by_id(id).await.unwrap().unwrap();
        token.expires_at = Some(Utc::now() - Duration::minutes(1));
        store.update(token.clone()).await.unwrap();
        assert_eq!(
            authorize(&bridge, None, Some(&secret), &RequiredAccess::Any, &store).await,
            Err(DenialReason::Expired)
        );

        token.expires_at = None;
        token.is_active = false;
        store.update(token).await.unwrap();
        assert_eq!(
            authorize(&bridge, None, Some(&secret), &RequiredAccess::Any, &store).await,
            Err(DenialReason::Inactive)
        );

        assert_eq!(
            authorize(&bridge, None, Some("mcpb_unknown"), &RequiredAccess::Any, &store).await,
            Err(DenialReason::UnknownToken)
        );
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer mcpb_abc"));
        assert_eq!(extract_bearer(&headers), Some("mcpb_abc"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_bearer(&headers), None);
    }
}
