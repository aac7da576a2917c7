// ABOUTME: Core data models shared by the bridge server and its collaborators
// ABOUTME: Bridge configurations, endpoint descriptors, access tokens and log entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Bridge Core
//!
//! Plain data types describing a REST API bridge. This crate has no I/O and
//! no knowledge of encryption, HTTP or JSON-RPC; it only defines the shapes
//! every other layer agrees on, plus the pure invariants over those shapes
//! (path template validation, permission matching, expiry checks).

/// Bridge, endpoint, token and log models
pub mod models;

pub use models::*;
