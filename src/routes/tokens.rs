// ABOUTME: Owner-facing REST routes for per-bridge access token management
// ABOUTME: Issues tokens (plaintext shown once), lists, updates and revokes them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use bridge_core::AccessToken;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::bridges::BridgeRoutes;
use crate::errors::AppError;
use crate::mcp::resources::ServerResources;
use crate::tokens::{apply_update, issue_token, CreateTokenRequest, IssuedToken, UpdateTokenRequest};

/// Response for token listing
#[derive(Debug, Serialize)]
pub struct ListTokensResponse {
    /// Tokens of the bridge, secrets excluded
    pub tokens: Vec<AccessToken>,
    /// Number of tokens
    pub total: usize,
}

/// Access token routes handler
pub struct TokenRoutes;

impl TokenRoutes {
    /// Create all token management routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/bridges/:bridge_id/tokens",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/api/bridges/:bridge_id/tokens/:token_id",
                patch(Self::handle_update).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Token `token_id` of bridge `bridge_id`, which the caller must own
    async fn owned_token(
        resources: &Arc<ServerResources>,
        headers: &HeaderMap,
        bridge_id: &str,
        token_id: Uuid,
    ) -> Result<AccessToken, AppError> {
        let session = BridgeRoutes::authenticate(headers, resources).await?;
        BridgeRoutes::owned_bridge(resources, &session, bridge_id).await?;
        resources
            .tokens
            .find_by_id(token_id)
            .await?
            .filter(|token| token.bridge_id == bridge_id)
            .ok_or_else(|| AppError::not_found(format!("Token {token_id}")))
    }

    /// Handle GET /api/bridges/:bridge_id/tokens
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bridge_id): Path<String>,
    ) -> Result<Response, AppError> {
        let session = BridgeRoutes::authenticate(&headers, &resources).await?;
        BridgeRoutes::owned_bridge(&resources, &session, &bridge_id).await?;

        let tokens = resources.tokens.find_by_bridge(&bridge_id).await?;
        let response = ListTokensResponse {
            total: tokens.len(),
            tokens,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/bridges/:bridge_id/tokens
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bridge_id): Path<String>,
        Json(request): Json<CreateTokenRequest>,
    ) -> Result<Response, AppError> {
        let session = BridgeRoutes::authenticate(&headers, &resources).await?;
        BridgeRoutes::owned_bridge(&resources, &session, &bridge_id).await?;

        let (token, secret) = issue_token(&bridge_id, request)?;
        resources.tokens.create(token.clone()).await?;
        info!(bridge_id = %bridge_id, token_id = %token.id, prefix = %token.token_prefix, "Access token issued");

        let response = IssuedToken {
            access_token: token,
            token: secret.as_str().to_owned(),
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle PATCH /api/bridges/:bridge_id/tokens/:token_id
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((bridge_id, token_id)): Path<(String, Uuid)>,
        Json(update): Json<UpdateTokenRequest>,
    ) -> Result<Response, AppError> {
        let mut token = Self::owned_token(&resources, &headers, &bridge_id, token_id).await?;
        apply_update(&mut token, update)?;
        resources.tokens.update(token.clone()).await?;
        info!(bridge_id = %bridge_id, token_id = %token_id, active = token.is_active, "Access token updated");

        Ok((StatusCode::OK, Json(token)).into_response())
    }

    /// Handle DELETE /api/bridges/:bridge_id/tokens/:token_id
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((bridge_id, token_id)): Path<(String, Uuid)>,
    ) -> Result<Response, AppError> {
        Self::owned_token(&resources, &headers, &bridge_id, token_id).await?;
        if !resources.tokens.delete(token_id).await? {
            return Err(AppError::not_found(format!("Token {token_id}")));
        }
        info!(bridge_id = %bridge_id, token_id = %token_id, "Access token revoked");

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
