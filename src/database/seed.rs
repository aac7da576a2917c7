// ABOUTME: Startup loading of bridge definitions from a JSON seed file
// ABOUTME: Seeds plaintext definitions into the bridge store with secrets sealed on load
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;

use bridge_core::BridgeDefinition;
use tracing::info;

use super::BridgeStore;
use crate::bridge::definition::build_configuration;
use crate::errors::{AppError, AppResult};
use crate::security::SecretEncryptionManager;

/// Load every bridge in `path` into `store`
///
/// The file holds a JSON array of bridge definitions; each must name its
/// owning `userId`. Loading stops at the first invalid entry.
///
/// # Errors
///
/// Returns a config error if the file cannot be read or parsed, or the error
/// of the first definition that fails validation or storage
pub async fn load_seed_file(
    path: &Path,
    store: &dyn BridgeStore,
    encryption: &SecretEncryptionManager,
) -> AppResult<usize> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::config(format!("Cannot read bridges file {}: {e}", path.display()))
    })?;
    let definitions: Vec<BridgeDefinition> = serde_json::from_str(&raw).map_err(|e| {
        AppError::config(format!("Invalid bridges file {}: {e}", path.display()))
    })?;

    let mut loaded = 0;
    for (index, mut definition) in definitions.into_iter().enumerate() {
        let user_id = definition
            .user_id
            .take()
            .filter(|user_id| !user_id.trim().is_empty())
            .ok_or_else(|| {
                AppError::config(format!("Bridge #{index} in seed file has no userId"))
            })?;
        let bridge = build_configuration(definition, &user_id, encryption, None)?;
        let bridge = store.create(bridge).await?;
        info!(
            bridge_id = %bridge.id,
            endpoints = bridge.endpoints.len(),
            "Seeded bridge"
        );
        loaded += 1;
    }

    Ok(loaded)
}
