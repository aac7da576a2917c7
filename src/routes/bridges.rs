// ABOUTME: Owner-facing REST routes for bridge configuration CRUD
// ABOUTME: Seals secrets on write, redacts them on read and cascades token deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Bridge management routes
//!
//! Every endpoint requires an owner session. Bridges owned by someone else
//! are reported as not found.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bridge_core::{AccessPolicy, AuthConfig, BridgeConfiguration, BridgeDefinition, EndpointDescriptor};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::auth::Session;
use crate::bridge::definition::{build_configuration, redacted_auth};
use crate::errors::AppError;
use crate::mcp::resources::ServerResources;

/// Bridge as returned by the management API, secrets redacted
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeView {
    /// Bridge identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Enabled flag
    pub enabled: bool,
    /// Upstream base URL
    pub base_url: String,
    /// Auth scheme with redacted secrets
    pub auth: AuthConfig<&'static str>,
    /// Static outbound headers
    pub headers: BTreeMap<String, String>,
    /// Access policy
    pub access: AccessPolicy,
    /// Endpoint descriptors
    pub endpoints: Vec<EndpointDescriptor>,
    /// Timeout override in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// MCP endpoint path for this bridge
    pub mcp_path: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<&BridgeConfiguration> for BridgeView {
    fn from(bridge: &BridgeConfiguration) -> Self {
        Self {
            id: bridge.id.clone(),
            name: bridge.name.clone(),
            description: bridge.description.clone(),
            enabled: bridge.enabled,
            base_url: bridge.base_url.clone(),
            auth: redacted_auth(&bridge.auth),
            headers: bridge.headers.clone(),
            access: bridge.access,
            endpoints: bridge.endpoints.clone(),
            timeout_ms: bridge.timeout_ms,
            mcp_path: format!("/mcp/{}", bridge.id),
            created_at: bridge.created_at,
            updated_at: bridge.updated_at,
        }
    }
}

/// Response for bridge listing
#[derive(Debug, Serialize)]
pub struct ListBridgesResponse {
    /// Bridges owned by the caller
    pub bridges: Vec<BridgeView>,
    /// Number of bridges
    pub total: usize,
}

/// Bridge routes handler
pub struct BridgeRoutes;

impl BridgeRoutes {
    /// Create all bridge management routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/bridges",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/bridges/:bridge_id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Resolve the owner session from cookie or header
    pub(crate) async fn authenticate(
        headers: &HeaderMap,
        resources: &Arc<ServerResources>,
    ) -> Result<Session, AppError> {
        resources
            .sessions
            .resolve(headers)
            .await
            .ok_or_else(AppError::auth_required)
    }

    /// Bridge `bridge_id` if it exists and belongs to `session`
    pub(crate) async fn owned_bridge(
        resources: &Arc<ServerResources>,
        session: &Session,
        bridge_id: &str,
    ) -> Result<Arc<BridgeConfiguration>, AppError> {
        resources
            .bridges
            .get_by_id(bridge_id)
            .await?
            .filter(|bridge| bridge.is_owned_by(&session.user_id))
            .ok_or_else(|| AppError::not_found(format!("Bridge {bridge_id}")))
    }

    /// Handle GET /api/bridges
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let session = Self::authenticate(&headers, &resources).await?;
        let bridges: Vec<BridgeView> = resources
            .bridges
            .list_for_user(&session.user_id)
            .await?
            .iter()
            .map(|bridge| BridgeView::from(bridge.as_ref()))
            .collect();

        let response = ListBridgesResponse {
            total: bridges.len(),
            bridges,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/bridges
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(definition): Json<BridgeDefinition>,
    ) -> Result<Response, AppError> {
        let session = Self::authenticate(&headers, &resources).await?;
        let bridge = build_configuration(definition, &session.user_id, &resources.encryption, None)?;
        let bridge = resources.bridges.create(bridge).await?;
        info!(bridge_id = %bridge.id, user_id = %session.user_id, "Bridge created");

        Ok((StatusCode::CREATED, Json(BridgeView::from(bridge.as_ref()))).into_response())
    }

    /// Handle GET /api/bridges/:bridge_id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bridge_id): Path<String>,
    ) -> Result<Response, AppError> {
        let session = Self::authenticate(&headers, &resources).await?;
        let bridge = Self::owned_bridge(&resources, &session, &bridge_id).await?;
        Ok((StatusCode::OK, Json(BridgeView::from(bridge.as_ref()))).into_response())
    }

    /// Handle PUT /api/bridges/:bridge_id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bridge_id): Path<String>,
        Json(definition): Json<BridgeDefinition>,
    ) -> Result<Response, AppError> {
        let session = Self::authenticate(&headers, &resources).await?;
        let existing = Self::owned_bridge(&resources, &session, &bridge_id).await?;
        let bridge = build_configuration(
            definition,
            &session.user_id,
            &resources.encryption,
            Some(&existing),
        )?;
        let bridge = resources.bridges.update(bridge).await?;
        info!(bridge_id = %bridge.id, "Bridge updated");

        Ok((StatusCode::OK, Json(BridgeView::from(bridge.as_ref()))).into_response())
    }

    /// Handle DELETE /api/bridges/:bridge_id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bridge_id): Path<String>,
    ) -> Result<Response, AppError> {
        let session = Self::authenticate(&headers, &resources).await?;
        Self::owned_bridge(&resources, &session, &bridge_id).await?;

        if !resources.bridges.delete(&bridge_id).await? {
            return Err(AppError::not_found(format!("Bridge {bridge_id}")));
        }
        let revoked = resources.tokens.delete_for_bridge(&bridge_id).await?;
        info!(bridge_id = %bridge_id, revoked, "Bridge deleted");

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
