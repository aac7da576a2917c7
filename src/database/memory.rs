// ABOUTME: DashMap-backed in-memory bridge and access token stores
// ABOUTME: Snapshot reads, digest index for token lookup and cascade deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{AccessToken, BridgeConfiguration};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{BridgeStore, TokenStore};
use crate::errors::{AppError, AppResult};
use crate::tokens::hash_secret;

/// Bridge store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryBridgeStore {
    bridges: DashMap<String, Arc<BridgeConfiguration>>,
}

impl InMemoryBridgeStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BridgeStore for InMemoryBridgeStore {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Arc<BridgeConfiguration>>> {
        Ok(self.bridges.get(id).map(|entry| Arc::clone(entry.value())))
    }

    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Arc<BridgeConfiguration>>> {
        let mut bridges: Vec<_> = self
            .bridges
            .iter()
            .filter(|entry| entry.is_owned_by(user_id))
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        bridges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bridges)
    }

    async fn create(&self, bridge: BridgeConfiguration) -> AppResult<Arc<BridgeConfiguration>> {
        match self.bridges.entry(bridge.id.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict(format!(
                "Bridge '{}' already exists",
                bridge.id
            ))),
            Entry::Vacant(slot) => {
                let bridge = Arc::new(bridge);
                slot.insert(Arc::clone(&bridge));
                debug!(bridge_id = %bridge.id, "Bridge created");
                Ok(bridge)
            }
        }
    }

    async fn update(&self, bridge: BridgeConfiguration) -> AppResult<Arc<BridgeConfiguration>> {
        let Some(mut slot) = self.bridges.get_mut(&bridge.id) else {
            return Err(AppError::not_found(format!("Bridge '{}'", bridge.id)));
        };
        let bridge = Arc::new(bridge);
        *slot = Arc::clone(&bridge);
        Ok(bridge)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.bridges.remove(id).is_some())
    }
}

/// Access token store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<Uuid, AccessToken>,
    by_hash: DashMap<String, Uuid>,
}

impl InMemoryTokenStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn find_by_bridge(&self, bridge_id: &str) -> AppResult<Vec<AccessToken>> {
        let mut tokens: Vec<_> = self
            .tokens
            .iter()
            .filter(|entry| entry.bridge_id == bridge_id)
            .map(|entry| entry.value().clone())
            .collect();
        tokens.sort_by_key(|token| token.created_at);
        Ok(tokens)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AccessToken>> {
        Ok(self.tokens.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_secret(&self, secret: &str) -> AppResult<Option<AccessToken>> {
        let digest = hash_secret(secret);
        let Some(id) = self.by_hash.get(&digest).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.tokens.get(&id).map(|entry| entry.value().clone()))
    }

    async fn touch_last_used(&self, id: Uuid) -> AppResult<()> {
        let mut token = self
            .tokens
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Access token {id}")))?;
        token.last_used_at = Some(Utc::now());
        Ok(())
    }

    async fn create(&self, token: AccessToken) -> AppResult<()> {
        if token.secret_hash.is_empty() {
            return Err(AppError::invalid_input("Access token has no secret digest"));
        }
        match self.by_hash.entry(token.secret_hash.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict("Access token secret already registered"))
            }
            Entry::Vacant(slot) => {
                slot.insert(token.id);
            }
        }
        self.tokens.insert(token.id, token);
        Ok(())
    }

    async fn update(&self, token: AccessToken) -> AppResult<()> {
        let mut slot = self
            .tokens
            .get_mut(&token.id)
            .ok_or_else(|| AppError::not_found(format!("Access token {}", token.id)))?;
        if slot.secret_hash != token.secret_hash {
            return Err(AppError::invalid_input(
                "Access token secret cannot be changed",
            ));
        }
        *slot = token;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let Some((_, token)) = self.tokens.remove(&id) else {
            return Ok(false);
        };
        self.by_hash.remove(&token.secret_hash);
        Ok(true)
    }

    async fn delete_for_bridge(&self, bridge_id: &str) -> AppResult<usize> {
        let ids: Vec<Uuid> = self
            .tokens
            .iter()
            .filter(|entry| entry.bridge_id == bridge_id)
            .map(|entry| *entry.key())
            .collect();
        let mut removed = 0;
        for id in ids {
            if self.delete(id).await? {
                removed += 1;
            }
        }
        debug!(bridge_id, removed, "Cascaded access token deletion");
        Ok(removed)
    }
}
