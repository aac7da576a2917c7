// ABOUTME: Storage abstractions for bridge configurations and access tokens
// ABOUTME: Async repository traits with in-memory implementations and seed loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Storage
//!
//! The dispatcher only sees the [`BridgeStore`] and [`TokenStore`] traits.
//! Bridges are handed out as `Arc` snapshots: a request keeps the snapshot it
//! looked up even if the bridge is replaced while the request is in flight.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{AccessToken, BridgeConfiguration};
use uuid::Uuid;

use crate::errors::AppResult;

/// In-memory store implementations
pub mod memory;
/// Startup seed file loading
pub mod seed;

pub use memory::{InMemoryBridgeStore, InMemoryTokenStore};

/// Bridge configuration repository
#[async_trait]
pub trait BridgeStore: Send + Sync {
    /// Bridge by id
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Arc<BridgeConfiguration>>>;

    /// Bridges owned by `user_id`, oldest first
    async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Arc<BridgeConfiguration>>>;

    /// Insert a new bridge
    ///
    /// Fails with a conflict error if the id is taken.
    async fn create(&self, bridge: BridgeConfiguration) -> AppResult<Arc<BridgeConfiguration>>;

    /// Replace an existing bridge
    ///
    /// Fails with a not-found error if the id is unknown.
    async fn update(&self, bridge: BridgeConfiguration) -> AppResult<Arc<BridgeConfiguration>>;

    /// Remove a bridge, returning whether it existed
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Access token repository
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Tokens belonging to a bridge, oldest first
    async fn find_by_bridge(&self, bridge_id: &str) -> AppResult<Vec<AccessToken>>;

    /// Token by id
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AccessToken>>;

    /// Token whose secret matches the presented plaintext
    async fn find_by_secret(&self, secret: &str) -> AppResult<Option<AccessToken>>;

    /// Stamp `last_used_at` with the current time
    async fn touch_last_used(&self, id: Uuid) -> AppResult<()>;

    /// Insert a new token
    async fn create(&self, token: AccessToken) -> AppResult<()>;

    /// Replace an existing token
    async fn update(&self, token: AccessToken) -> AppResult<()>;

    /// Remove a token, returning whether it existed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Remove every token of a bridge, returning how many were removed
    async fn delete_for_bridge(&self, bridge_id: &str) -> AppResult<usize>;
}
