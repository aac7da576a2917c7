// ABOUTME: Shared server resources injected into the dispatcher and HTTP routes
// ABOUTME: Configuration, stores, encryption, sessions, rate limiter, executor and log sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Every collaborator is built once at startup and shared through
//! `Arc<ServerResources>`. The `with_*` builders swap in alternative
//! implementations, which is how tests inject mock executors and stores.

use std::sync::Arc;

use tracing::info;

use crate::auth::{JwtSessionResolver, NoSessionResolver, SessionResolver};
use crate::bridge::executor::{HttpExecutor, ReqwestExecutor};
use crate::config::environment::ServerConfig;
use crate::database::{BridgeStore, InMemoryBridgeStore, InMemoryTokenStore, TokenStore};
use crate::errors::AppResult;
use crate::rate_limiting::{limiter_from_config, RateLimiter};
use crate::security::audit::{BridgeLogSink, TracingLogSink};
use crate::security::SecretEncryptionManager;

/// Collaborators shared by every request
#[derive(Clone)]
pub struct ServerResources {
    /// Process-wide configuration
    pub config: Arc<ServerConfig>,
    /// Bridge configuration store
    pub bridges: Arc<dyn BridgeStore>,
    /// Access token store
    pub tokens: Arc<dyn TokenStore>,
    /// Upstream secret sealing
    pub encryption: Arc<SecretEncryptionManager>,
    /// Owner session resolution
    pub sessions: Arc<dyn SessionResolver>,
    /// Request rate limiting
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Outbound HTTP execution
    pub executor: Arc<dyn HttpExecutor>,
    /// Bridge activity log
    pub log_sink: Arc<dyn BridgeLogSink>,
}

impl ServerResources {
    /// Build the default collaborators for `config`
    ///
    /// Stores are in memory, the log sink writes to tracing and sessions are
    /// verified only when a session secret is configured.
    ///
    /// # Errors
    ///
    /// Returns a config error for an empty encryption secret, or an internal
    /// error if the HTTP client cannot be built
    pub fn new(config: ServerConfig) -> AppResult<Self> {
        let encryption = Arc::new(SecretEncryptionManager::new(&config.encryption_secret)?);
        let sessions: Arc<dyn SessionResolver> = match &config.session_secret {
            Some(secret) => Arc::new(JwtSessionResolver::new(secret.as_bytes())),
            None => {
                info!("No session secret configured; owner sessions disabled");
                Arc::new(NoSessionResolver)
            }
        };
        let rate_limiter = limiter_from_config(&config.rate_limit);
        let executor = Arc::new(ReqwestExecutor::new(config.max_upstream_body_bytes)?);

        Ok(Self {
            config: Arc::new(config),
            bridges: Arc::new(InMemoryBridgeStore::new()),
            tokens: Arc::new(InMemoryTokenStore::new()),
            encryption,
            sessions,
            rate_limiter,
            executor,
            log_sink: Arc::new(TracingLogSink),
        })
    }

    /// Replace the bridge store
    #[must_use]
    pub fn with_bridge_store(mut self, bridges: Arc<dyn BridgeStore>) -> Self {
        self.bridges = bridges;
        self
    }

    /// Replace the token store
    #[must_use]
    pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Replace the session resolver
    #[must_use]
    pub fn with_session_resolver(mut self, sessions: Arc<dyn SessionResolver>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the rate limiter
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Replace the HTTP executor
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn HttpExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Replace the log sink
    #[must_use]
    pub fn with_log_sink(mut self, log_sink: Arc<dyn BridgeLogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }
}
