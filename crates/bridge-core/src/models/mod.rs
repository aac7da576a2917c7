// ABOUTME: Model module organization for bridge configuration and access control types
// ABOUTME: Re-exports bridge, endpoint, access token and log entry models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Access tokens and fine-grained permissions
pub mod access_token;
/// Bridge log entries recorded through the audit sink
pub mod audit;
/// Bridge configuration, auth configuration and access policy
pub mod bridge;
/// Endpoint descriptors and their typed parameters
pub mod endpoint;

pub use access_token::{
    AccessToken, CapabilityType, Permission, PermissionConstraints, ANY_ACTION,
};
pub use audit::{BridgeLogEntry, BridgeLogLevel};
pub use bridge::{
    AccessPolicy, ApiKeyLocation, AuthConfig, BridgeConfiguration, BridgeDefinition, SealedSecret,
};
pub use endpoint::{
    DescriptorError, EndpointDescriptor, HttpMethod, Parameter, ParameterType, RequestBodySchema,
    DEFAULT_BODY_CONTENT_TYPE,
};
