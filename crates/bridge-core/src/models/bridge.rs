// ABOUTME: Bridge configuration model mapping one REST API onto one MCP tool catalog
// ABOUTME: Defines auth configuration union, access policy and sealed secret wrapper
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::endpoint::{DescriptorError, EndpointDescriptor};

/// Ciphertext of a secret stored at rest
///
/// The inner value is opaque to this crate; the server's encryption manager
/// produces and consumes it. `Debug` never prints the ciphertext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SealedSecret(String);

impl SealedSecret {
    /// Wrap an already-encrypted value
    #[must_use]
    pub const fn new(ciphertext: String) -> Self {
        Self(ciphertext)
    }

    /// Borrow the ciphertext
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SealedSecret(..)")
    }
}

/// Where an API key travels on the outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    /// Sent as a request header
    Header,
    /// Sent as a query-string parameter
    Query,
}

/// Authentication scheme used against the upstream API
///
/// Generic over the secret representation: `AuthConfig<SealedSecret>` is what
/// the bridge store holds, `AuthConfig<String>` is the plaintext form used on
/// input and immediately before injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthConfig<S = SealedSecret> {
    /// No authentication
    None,
    /// `Authorization: Bearer <token>`
    Bearer {
        /// Bearer token
        token: S,
    },
    /// API key in a header or query parameter
    ApiKey {
        /// API key value
        key: S,
        /// Header or query placement
        location: ApiKeyLocation,
        /// Header or query parameter name
        #[serde(rename = "paramName", alias = "headerName")]
        param_name: String,
    },
    /// `Authorization: Basic <base64(username:password)>`
    Basic {
        /// Username
        username: String,
        /// Password
        password: S,
    },
}

impl<S> Default for AuthConfig<S> {
    fn default() -> Self {
        Self::None
    }
}

impl<S> AuthConfig<S> {
    /// Convert every secret with `f`, preserving the scheme
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`
    pub fn try_map_secrets<T, E>(
        self,
        mut f: impl FnMut(S) -> Result<T, E>,
    ) -> Result<AuthConfig<T>, E> {
        Ok(match self {
            Self::None => AuthConfig::None,
            Self::Bearer { token } => AuthConfig::Bearer { token: f(token)? },
            Self::ApiKey {
                key,
                location,
                param_name,
            } => AuthConfig::ApiKey {
                key: f(key)?,
                location,
                param_name,
            },
            Self::Basic { username, password } => AuthConfig::Basic {
                username,
                password: f(password)?,
            },
        })
    }

    /// Short scheme name for logs
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bearer { .. } => "bearer",
            Self::ApiKey { .. } => "apiKey",
            Self::Basic { .. } => "basic",
        }
    }
}

/// Who may call a bridge's MCP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    /// Public bridges accept unauthenticated discovery calls
    #[serde(default)]
    pub public: bool,
    /// On a public bridge, still require a credential for `tools/call`
    #[serde(default)]
    pub auth_required: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            public: false,
            auth_required: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// A configured mapping from one REST API to one MCP tool catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfiguration {
    /// Bridge identifier, used in the MCP endpoint path
    pub id: String,
    /// Owning user (creator)
    pub user_id: String,
    /// Display name, reported as the MCP server name
    pub name: String,
    /// Optional human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Disabled bridges behave as if they did not exist
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Base URL every endpoint path is joined onto
    pub base_url: String,
    /// Upstream authentication with secrets sealed at rest
    #[serde(default)]
    pub auth: AuthConfig<SealedSecret>,
    /// Static headers merged into every outbound request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Access policy for inbound MCP calls
    #[serde(default)]
    pub access: AccessPolicy,
    /// Ordered endpoint descriptors
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
    /// Upstream timeout override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl BridgeConfiguration {
    /// Whether `user_id` owns this bridge
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Endpoints visible in the tool catalog, in declaration order
    pub fn enabled_endpoints(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter().filter(|endpoint| endpoint.enabled)
    }

    /// Validate every endpoint descriptor
    ///
    /// # Errors
    ///
    /// Returns the first descriptor invariant violation
    pub fn validate_endpoints(&self) -> Result<(), DescriptorError> {
        self.endpoints.iter().try_for_each(EndpointDescriptor::validate)
    }
}

/// Bridge as supplied by its owner, with plaintext secrets
///
/// Accepted by the management API and the startup seed file. Secrets are
/// sealed before the definition becomes a [`BridgeConfiguration`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeDefinition {
    /// Requested identifier; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Owning user, only honoured by the seed file
    #[serde(default)]
    pub user_id: Option<String>,
    /// Display name
    pub name: String,
    /// Optional human description
    #[serde(default)]
    pub description: Option<String>,
    /// Enabled flag
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upstream base URL
    pub base_url: String,
    /// Upstream authentication with plaintext secrets
    #[serde(default)]
    pub auth: AuthConfig<String>,
    /// Static outbound headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Access policy
    #[serde(default)]
    pub access: AccessPolicy,
    /// Endpoint descriptors
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
    /// Upstream timeout override in milliseconds
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_defaults() {
        let definition: BridgeDefinition = serde_json::from_value(json!({
            "name": "Test Bridge",
            "baseUrl": "https://api.example.com",
            "auth": {"type": "bearer", "token": "t0k"}
        }))
        .unwrap();
        assert!(definition.enabled);
        assert!(definition.id.is_none());
        assert_eq!(definition.access, AccessPolicy::default());
        assert_eq!(definition.auth.scheme(), "bearer");
    }

    #[test]
    fn test_auth_config_wire_format() {
        let auth: AuthConfig<String> = serde_json::from_value(json!({
            "type": "apiKey",
            "key": "k-123",
            "location": "query",
            "paramName": "api_key"
        }))
        .unwrap();
        assert_eq!(
            auth,
            AuthConfig::ApiKey {
                key: "k-123".to_owned(),
                location: ApiKeyLocation::Query,
                param_name: "api_key".to_owned(),
            }
        );

        let header_alias: AuthConfig<String> = serde_json::from_value(json!({
            "type": "apiKey",
            "key": "k",
            "location": "header",
            "headerName": "X-Api-Key"
        }))
        .unwrap();
        assert!(matches!(header_alias, AuthConfig::ApiKey { param_name, .. } if param_name == "X-Api-Key"));

        let none: AuthConfig<String> = serde_json::from_value(json!({"type": "none"})).unwrap();
        assert_eq!(none, AuthConfig::None);
    }

    #[test]
    fn test_try_map_secrets_keeps_scheme() {
        let plain = AuthConfig::Basic {
            username: "alice".to_owned(),
            password: "pw".to_owned(),
        };
        let sealed: AuthConfig<SealedSecret> = plain
            .try_map_secrets(|s| Ok::<_, ()>(SealedSecret::new(format!("enc:{s}"))))
            .unwrap();
        match sealed {
            AuthConfig::Basic { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password.as_str(), "enc:pw");
            }
            other => panic!("unexpected scheme {other:?}"),
        }
    }

    #[test]
    fn test_sealed_secret_debug_is_redacted() {
        let secret = SealedSecret::new("c2VjcmV0".to_owned());
        assert_eq!(format!("{secret:?}"), "SealedSecret(..)");
    }

    #[test]
    fn test_access_policy_default_is_private() {
        let policy = AccessPolicy::default();
        assert!(!policy.public);
        assert!(policy.auth_required);
    }
}
