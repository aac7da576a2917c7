// ABOUTME: Configuration module for the bridge server
// ABOUTME: Environment-driven server, logging and rate limit settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment variable parsing into `ServerConfig`
pub mod environment;

pub use environment::{LogFormat, LoggingConfig, RateLimitConfig, ServerConfig};
