// ABOUTME: REST bridge translation engine turning tool calls into upstream HTTP requests
// ABOUTME: Argument validation, request building, auth injection, execution and result translation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Bridge Translation Engine
//!
//! A `tools/call` flows through these stages in order:
//!
//! 1. [`arguments::validate_arguments`] checks the raw arguments against the
//!    endpoint descriptor and produces a typed record
//! 2. [`request::build_request`] templates the path and places the remaining
//!    arguments into the query string or body
//! 3. [`auth_injector::inject_auth`] applies the opened upstream credentials
//! 4. [`executor::HttpExecutor`] performs the call under a hard timeout
//! 5. [`response::translate_outcome`] turns the outcome into a tool result
//!
//! Bridge definitions supplied by owners are validated and sealed by
//! [`definition::build_configuration`].

/// Typed validation of tool call arguments
pub mod arguments;
/// Upstream credential injection
pub mod auth_injector;
/// Owner-supplied bridge definitions
pub mod definition;
/// Outbound HTTP execution
pub mod executor;
/// Outbound request construction
pub mod request;
/// Upstream outcome translation
pub mod response;
