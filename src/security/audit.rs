// ABOUTME: Bridge activity log sinks for dispatcher and upstream call events
// ABOUTME: Tracing-backed sink, bounded in-memory sink and fire-and-forget recording
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Bridge Activity Log
//!
//! The dispatcher records one entry per notable event (denied call, tool
//! call, upstream failure). Recording never blocks or fails the request that
//! produced it: [`record_detached`] hands the entry to a spawned task.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_core::{BridgeLogEntry, BridgeLogLevel};
use tracing::{error, info, warn};

/// Destination for bridge activity entries
#[async_trait]
pub trait BridgeLogSink: Send + Sync {
    /// Persist one entry
    async fn record(&self, entry: BridgeLogEntry);
}

/// Record `entry` without awaiting the sink
pub fn record_detached(sink: &Arc<dyn BridgeLogSink>, entry: BridgeLogEntry) {
    let sink = Arc::clone(sink);
    tokio::spawn(async move {
        sink.record(entry).await;
    });
}

/// Sink that writes entries to the structured log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

#[async_trait]
impl BridgeLogSink for TracingLogSink {
    async fn record(&self, entry: BridgeLogEntry) {
        match entry.level {
            BridgeLogLevel::Info => info!(
                entry_id = %entry.id,
                bridge_id = %entry.bridge_id,
                metadata = %entry.metadata,
                "Bridge event: {}",
                entry.message
            ),
            BridgeLogLevel::Warning => warn!(
                entry_id = %entry.id,
                bridge_id = %entry.bridge_id,
                metadata = %entry.metadata,
                "Bridge event: {}",
                entry.message
            ),
            BridgeLogLevel::Error => error!(
                entry_id = %entry.id,
                bridge_id = %entry.bridge_id,
                metadata = %entry.metadata,
                "Bridge event: {}",
                entry.message
            ),
        }
    }
}

/// Sink that keeps the most recent entries in memory
///
/// Oldest entries are evicted once `capacity` is reached.
#[derive(Debug)]
pub struct InMemoryLogSink {
    capacity: usize,
    entries: Mutex<VecDeque<BridgeLogEntry>>,
}

impl InMemoryLogSink {
    /// Create a sink retaining at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Retained entries for one bridge, oldest first
    #[must_use]
    pub fn entries_for(&self, bridge_id: &str) -> Vec<BridgeLogEntry> {
        self.entries.lock().map_or_else(
            |_| Vec::new(),
            |entries| {
                entries
                    .iter()
                    .filter(|entry| entry.bridge_id == bridge_id)
                    .cloned()
                    .collect()
            },
        )
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// Whether no entries are retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BridgeLogSink for InMemoryLogSink {
    async fn record(&self, entry: BridgeLogEntry) {
        let Ok(mut entries) = self.entries.lock() else {
            error!("Bridge log sink lock poisoned; dropping entry");
            return;
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }
}
