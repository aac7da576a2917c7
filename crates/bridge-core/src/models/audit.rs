// ABOUTME: Bridge log entry types recorded through the fire-and-forget audit sink
// ABOUTME: BridgeLogLevel and BridgeLogEntry DTOs with builder pattern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a bridge log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeLogLevel {
    /// Normal operation
    Info,
    /// Request declined or upstream refused the call
    Warning,
    /// The bridge itself failed
    Error,
}

/// One entry in a bridge's activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeLogEntry {
    /// Unique entry identifier
    pub id: Uuid,
    /// Bridge the entry belongs to
    pub bridge_id: String,
    /// Severity
    pub level: BridgeLogLevel,
    /// Human-readable message
    pub message: String,
    /// Structured context (method, tool, status, timing)
    pub metadata: serde_json::Value,
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
}

impl BridgeLogEntry {
    /// Create a new log entry with empty metadata
    #[must_use]
    pub fn new(bridge_id: impl Into<String>, level: BridgeLogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bridge_id: bridge_id.into(),
            level,
            message: message.into(),
            metadata: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    /// Attach structured metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
