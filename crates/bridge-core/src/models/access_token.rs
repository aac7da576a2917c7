// ABOUTME: Access token model for bearer credentials scoped to a single bridge
// ABOUTME: Permission sets with capability types, allowed actions and tool constraints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Action wildcard matching every action of a capability
pub const ANY_ACTION: &str = "*";

/// Capability families a permission can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityType {
    /// `tools/*` methods
    Tools,
    /// `resources/*` methods
    Resources,
    /// `prompts/*` methods
    Prompts,
    /// Every capability
    Admin,
}

/// Optional narrowing of a permission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionConstraints {
    /// Tool names this permission is limited to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
}

/// One capability grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Capability family
    #[serde(rename = "type")]
    pub capability: CapabilityType,
    /// Allowed actions (`list`, `call`, `read`, `get`, or `*`)
    #[serde(default)]
    pub actions: Vec<String>,
    /// Optional constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<PermissionConstraints>,
}

impl Permission {
    /// Grant every action on a capability
    #[must_use]
    pub fn all(capability: CapabilityType) -> Self {
        Self {
            capability,
            actions: vec![ANY_ACTION.to_owned()],
            constraints: None,
        }
    }

    /// Whether this permission covers `action` on `capability`
    #[must_use]
    pub fn allows(&self, capability: CapabilityType, action: &str) -> bool {
        let capability_matches =
            self.capability == CapabilityType::Admin || self.capability == capability;
        capability_matches
            && self
                .actions
                .iter()
                .any(|allowed| allowed == ANY_ACTION || allowed == action)
    }

    /// Whether `tool` passes this permission's tool constraint
    #[must_use]
    pub fn allows_tool(&self, tool: &str) -> bool {
        self.constraints
            .as_ref()
            .and_then(|c| c.allowed_tools.as_ref())
            .map_or(true, |tools| tools.iter().any(|t| t == tool))
    }
}

/// Bearer credential scoped to one bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    /// Token identifier
    pub id: Uuid,
    /// Owning bridge
    pub bridge_id: String,
    /// Human name
    pub name: String,
    /// Optional human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// First characters of the secret, for display only
    pub token_prefix: String,
    /// SHA-256 hex digest of the secret value
    #[serde(skip_serializing, default)]
    pub secret_hash: String,
    /// Granted permissions
    pub permissions: Vec<Permission>,
    /// Optional expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Soft-revocation flag
    pub is_active: bool,
    /// Last successful use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token has passed its expiry at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether the token is active and unexpired at `now`
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }

    /// Whether any permission covers `action` on `capability`
    #[must_use]
    pub fn permits(&self, capability: CapabilityType, action: &str) -> bool {
        self.permissions
            .iter()
            .any(|permission| permission.allows(capability, action))
    }

    /// Whether any permission covering tool calls admits `tool`
    #[must_use]
    pub fn permits_tool(&self, action: &str, tool: &str) -> bool {
        self.permissions.iter().any(|permission| {
            permission.allows(CapabilityType::Tools, action) && permission.allows_tool(tool)
        })
    }
}
